//! Session Authenticator.
//!
//! 署名付きセッショントークンの発行・検証。
//! 形式は `v1.<base64url payload>.<base64url signature>`、署名は
//! サーバ保持の secret による HMAC-SHA256。payload に有効期限を含む。
//!
//! 検証は純粋（副作用なし）。HTTP ハンドラからはリクエスト毎に、
//! WebSocket からは接続確立時に 1 度だけ呼ばれ、得られた Identity は
//! 接続の生存期間中は不変。

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::domain::{AuthError, Identity};

const TOKEN_VERSION: &str = "v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// User id
    sub: i64,
    /// Display name
    name: String,
    /// Expiry, Unix seconds
    exp: u64,
}

/// Issues and verifies signed session tokens.
pub struct SessionAuthenticator {
    secret: String,
}

impl SessionAuthenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issue a token for `identity`, valid for `ttl`.
    ///
    /// ログイン経路（本リポジトリ外の協調コンポーネント）とテストが使う。
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> String {
        let exp = now_secs() + ttl.as_secs();
        let claims = Claims {
            sub: identity.id,
            name: identity.display_name.clone(),
            exp,
        };
        let payload = serde_json::to_vec(&claims).expect("serialize claims");
        let payload_b64 = URL_SAFE_NO_PAD.encode(payload);
        let sig_b64 = URL_SAFE_NO_PAD.encode(self.sign(payload_b64.as_bytes()));
        format!("{TOKEN_VERSION}.{payload_b64}.{sig_b64}")
    }

    /// Verify signature and expiry, and extract the Identity.
    ///
    /// 失敗理由は区別せず一律 `AuthError::Unauthorized` を返す。
    pub fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        let parts = token.split('.').collect::<Vec<_>>();
        if parts.len() != 3 || parts[0] != TOKEN_VERSION {
            return Err(AuthError::Unauthorized);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|_| AuthError::Unauthorized)?;
        let provided_sig = URL_SAFE_NO_PAD
            .decode(parts[2])
            .map_err(|_| AuthError::Unauthorized)?;
        let expected_sig = self.sign(parts[1].as_bytes());

        if !constant_time_eq(&expected_sig, &provided_sig) {
            return Err(AuthError::Unauthorized);
        }

        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::Unauthorized)?;
        if claims.exp <= now_secs() {
            return Err(AuthError::Unauthorized);
        }

        Ok(Identity {
            id: claims.sub,
            display_name: claims.name,
        })
    }

    fn sign(&self, payload_b64: &[u8]) -> Vec<u8> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes()).expect("hmac key");
        mac.update(payload_b64);
        mac.finalize().into_bytes().to_vec()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }

    diff == 0
}
