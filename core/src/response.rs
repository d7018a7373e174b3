//! Response validation and decoding.
//!
//! Only the numeric status decides success. The body of a failed response is
//! never read, and a body that fails to decode keeps the decoder's error as
//! the `source` of `Error::Decoding`.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::decode::Decoder;
use crate::error::{Error, Result};
use crate::http::HttpResponse;

/// Fail with `GeneralError` unless the status is in `200..=299`.
pub fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    warn!(status = response.status, "request failed with non-success status");
    Err(Error::GeneralError {
        status_code: response.status,
        message: None,
    })
}

/// Decode the response body with `decoder`.
pub fn decode_body<T, D>(decoder: &D, response: &HttpResponse) -> Result<T>
where
    T: DeserializeOwned,
    D: Decoder,
{
    decoder.decode(&response.body).map_err(|source| {
        warn!(
            target_type = std::any::type_name::<T>(),
            error = %source,
            "failed to decode response body"
        );
        Error::Decoding {
            message: "can't decode data".to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::decode::JsonDecoder;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u64,
    }

    #[test]
    fn success_statuses_pass() {
        for status in [200, 201, 204, 299] {
            assert!(check_status(&HttpResponse::new(status, "")).is_ok());
        }
    }

    #[test]
    fn failure_status_ignores_body() {
        let response = HttpResponse::new(404, r#"{"message":"no such item"}"#);
        let err = check_status(&response).unwrap_err();
        assert!(matches!(
            err,
            Error::GeneralError {
                status_code: 404,
                message: None
            }
        ));
    }

    #[test]
    fn redirect_status_is_a_failure() {
        assert!(matches!(
            check_status(&HttpResponse::new(302, "")),
            Err(Error::GeneralError { status_code: 302, .. })
        ));
    }

    #[test]
    fn decode_body_success() {
        let item: Item = decode_body(&JsonDecoder, &HttpResponse::new(200, r#"{"id":1}"#)).unwrap();
        assert_eq!(item, Item { id: 1 });
    }

    #[test]
    fn decode_body_wraps_failure() {
        let err = decode_body::<Item, _>(&JsonDecoder, &HttpResponse::new(200, "not json"))
            .unwrap_err();
        match err {
            Error::Decoding { message, source } => {
                assert_eq!(message, "can't decode data");
                assert!(source.downcast_ref::<serde_json::Error>().is_some());
            }
            other => panic!("expected Decoding, got {other:?}"),
        }
    }
}
