/// Client address extractor
///
/// Uses the socket peer address. Behind a reverse proxy, set
/// `CODE_TRUST_FORWARDED_FOR` so that the first `X-Forwarded-For` hop is
/// used instead; without it the header is ignored, since clients can
/// forge it.

use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};

use crate::app::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Best known client address, None when it cannot be determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

/// First address of an `X-Forwarded-For` value
pub fn first_forwarded(value: &str) -> Option<IpAddr> {
    value.split(',').next()?.trim().parse().ok()
}

#[async_trait]
impl FromRequestParts<AppState> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.config.codes.trust_forwarded_for {
            let forwarded = parts
                .headers
                .get(FORWARDED_FOR)
                .and_then(|value| value.to_str().ok())
                .and_then(first_forwarded);

            if forwarded.is_some() {
                return Ok(ClientIp(forwarded));
            }
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientIp(peer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_forwarded() {
        assert_eq!(
            first_forwarded("203.0.113.7, 10.0.0.1"),
            Some("203.0.113.7".parse().unwrap())
        );
        assert_eq!(first_forwarded("::1"), Some("::1".parse().unwrap()));
        assert_eq!(first_forwarded("unknown"), None);
        assert_eq!(first_forwarded(""), None);
    }
}
