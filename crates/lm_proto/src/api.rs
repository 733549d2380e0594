//! Signup/login request and response bodies.
//! These map directly to the JSON exchanged with the account service.

use serde::{Deserialize, Serialize};

use lm_crypto::{Address, KeyEnvelope};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupResponse {
    pub message: String,
    pub eth_address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Everything the client needs to unseal its signing key locally.
/// The server never sees the unsealed key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub username: String,
    pub eth_address: Address,
    pub encrypted_key: KeyEnvelope,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lm_crypto::custody::seal_with;

    #[test]
    fn login_response_wire_shape() {
        let env = seal_with(b"k", "pw", &[0u8; 16], &[1u8; 16]);
        let res = LoginResponse {
            username: "alice".into(),
            eth_address: "0x00000000000000000000000000000000000000aa".parse().unwrap(),
            encrypted_key: env,
        };
        let v = serde_json::to_value(&res).unwrap();
        assert_eq!(v["eth_address"], "0x00000000000000000000000000000000000000aa");
        assert_eq!(v["encrypted_key"]["salt"], "00".repeat(16));
        assert_eq!(v["encrypted_key"]["iv"], "01".repeat(16));
        assert!(v["encrypted_key"]["encryptedData"].is_string());

        let back: LoginResponse = serde_json::from_value(v).unwrap();
        assert_eq!(back.encrypted_key, res.encrypted_key);
    }

    #[test]
    fn error_body_omits_missing_detail() {
        let body = ErrorBody { message: "User not found.".into(), error: None };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"message":"User not found."}"#);
    }
}
