//! Token issuance and verification for admin and end-user principals
//!
//! The two principal kinds live in disjoint signing-key domains, and within
//! each domain access and refresh tokens use separate secrets. Claims carry
//! an explicit `kind` tag that is checked on every verification, so a token
//! minted for one kind is rejected as the other even if the secrets were
//! ever accidentally shared.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};
use shared::AdminRole;

/// Principal kind embedded in every token payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Admin,
    User,
}

/// Claims carried by admin tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Admin id
    pub sub: String,
    pub email: String,
    pub role: AdminRole,
    pub kind: PrincipalKind,
    pub exp: i64,
    pub iat: i64,
}

impl AdminClaims {
    pub fn admin_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::InvalidToken)
    }
}

/// Claims carried by end-user tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// User id
    pub sub: String,
    pub phone: String,
    pub kind: PrincipalKind,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::InvalidToken)
    }
}

/// Access/refresh token pair returned by auth endpoints
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Signs and verifies tokens for both principal domains
#[derive(Clone)]
pub struct TokenIssuer {
    admin_secret: String,
    admin_refresh_secret: String,
    user_secret: String,
    user_refresh_secret: String,
    access_expiry: i64,
    refresh_expiry: i64,
}

impl TokenIssuer {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            admin_secret: config.admin_secret.clone(),
            admin_refresh_secret: config.admin_refresh_secret.clone(),
            user_secret: config.user_secret.clone(),
            user_refresh_secret: config.user_refresh_secret.clone(),
            access_expiry: config.access_token_expiry,
            refresh_expiry: config.refresh_token_expiry,
        }
    }

    /// Issue an access/refresh pair for an administrator
    pub fn issue_admin_pair(
        &self,
        admin_id: Uuid,
        email: &str,
        role: AdminRole,
    ) -> AppResult<TokenPair> {
        let now = Utc::now();
        let access = AdminClaims {
            sub: admin_id.to_string(),
            email: email.to_string(),
            role,
            kind: PrincipalKind::Admin,
            exp: (now + Duration::seconds(self.access_expiry)).timestamp(),
            iat: now.timestamp(),
        };
        let refresh = AdminClaims {
            exp: (now + Duration::seconds(self.refresh_expiry)).timestamp(),
            ..access.clone()
        };

        Ok(TokenPair {
            access_token: sign(&access, &self.admin_secret)?,
            refresh_token: sign(&refresh, &self.admin_refresh_secret)?,
            token_type: "Bearer".to_string(),
            expires_in: self.access_expiry,
        })
    }

    /// Issue an access/refresh pair for an end user
    pub fn issue_user_pair(&self, user_id: Uuid, phone: &str) -> AppResult<TokenPair> {
        let now = Utc::now();
        let access = UserClaims {
            sub: user_id.to_string(),
            phone: phone.to_string(),
            kind: PrincipalKind::User,
            exp: (now + Duration::seconds(self.access_expiry)).timestamp(),
            iat: now.timestamp(),
        };
        let refresh = UserClaims {
            exp: (now + Duration::seconds(self.refresh_expiry)).timestamp(),
            ..access.clone()
        };

        Ok(TokenPair {
            access_token: sign(&access, &self.user_secret)?,
            refresh_token: sign(&refresh, &self.user_refresh_secret)?,
            token_type: "Bearer".to_string(),
            expires_in: self.access_expiry,
        })
    }

    pub fn verify_admin_access(&self, token: &str) -> AppResult<AdminClaims> {
        let claims: AdminClaims = verify(token, &self.admin_secret)?;
        check_kind(claims.kind, PrincipalKind::Admin)?;
        Ok(claims)
    }

    pub fn verify_admin_refresh(&self, token: &str) -> AppResult<AdminClaims> {
        let claims: AdminClaims = verify(token, &self.admin_refresh_secret)?;
        check_kind(claims.kind, PrincipalKind::Admin)?;
        Ok(claims)
    }

    pub fn verify_user_access(&self, token: &str) -> AppResult<UserClaims> {
        let claims: UserClaims = verify(token, &self.user_secret)?;
        check_kind(claims.kind, PrincipalKind::User)?;
        Ok(claims)
    }

    pub fn verify_user_refresh(&self, token: &str) -> AppResult<UserClaims> {
        let claims: UserClaims = verify(token, &self.user_refresh_secret)?;
        check_kind(claims.kind, PrincipalKind::User)?;
        Ok(claims)
    }
}

fn sign<C: Serialize>(claims: &C, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))
}

fn verify<C: for<'de> Deserialize<'de>>(token: &str, secret: &str) -> AppResult<C> {
    decode::<C>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })
}

fn check_kind(got: PrincipalKind, expected: PrincipalKind) -> AppResult<()> {
    if got == expected {
        Ok(())
    } else {
        Err(AppError::WrongTokenKind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&JwtConfig {
            admin_secret: "admin-access-secret".into(),
            admin_refresh_secret: "admin-refresh-secret".into(),
            user_secret: "user-access-secret".into(),
            user_refresh_secret: "user-refresh-secret".into(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        })
    }

    #[test]
    fn test_admin_round_trip() {
        let issuer = issuer();
        let id = Uuid::new_v4();
        let pair = issuer
            .issue_admin_pair(id, "admin@mercado.pe", AdminRole::Editor)
            .unwrap();

        let claims = issuer.verify_admin_access(&pair.access_token).unwrap();
        assert_eq!(claims.admin_id().unwrap(), id);
        assert_eq!(claims.email, "admin@mercado.pe");
        assert_eq!(claims.kind, PrincipalKind::Admin);

        let refresh = issuer.verify_admin_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.admin_id().unwrap(), id);
    }

    #[test]
    fn test_user_round_trip() {
        let issuer = issuer();
        let id = Uuid::new_v4();
        let pair = issuer.issue_user_pair(id, "+51987654321").unwrap();

        let claims = issuer.verify_user_access(&pair.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), id);
        assert_eq!(claims.phone, "+51987654321");
    }

    #[test]
    fn test_domains_are_mutually_rejecting() {
        let issuer = issuer();
        let admin = issuer
            .issue_admin_pair(Uuid::new_v4(), "admin@mercado.pe", AdminRole::Superadmin)
            .unwrap();
        let user = issuer.issue_user_pair(Uuid::new_v4(), "+51987654321").unwrap();

        assert!(issuer.verify_user_access(&admin.access_token).is_err());
        assert!(issuer.verify_admin_access(&user.access_token).is_err());
    }

    #[test]
    fn test_kind_tag_rejects_even_with_shared_secrets() {
        // Misconfigured deployment where every secret is the same value: a
        // token with the full admin claim shape but the user kind tag must
        // still be turned away.
        let issuer = TokenIssuer::new(&JwtConfig {
            admin_secret: "same".into(),
            admin_refresh_secret: "same".into(),
            user_secret: "same".into(),
            user_refresh_secret: "same".into(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        });

        let now = Utc::now();
        let claims = AdminClaims {
            sub: Uuid::new_v4().to_string(),
            email: "admin@mercado.pe".to_string(),
            role: AdminRole::Editor,
            kind: PrincipalKind::User,
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
        };
        let token = sign(&claims, "same").unwrap();

        let err = issuer.verify_admin_access(&token).unwrap_err();
        assert!(matches!(err, AppError::WrongTokenKind));
    }

    #[test]
    fn test_cross_domain_claims_never_parse() {
        // A user token carries no email/role, so even with shared secrets it
        // cannot be read as an admin token.
        let issuer = TokenIssuer::new(&JwtConfig {
            admin_secret: "same".into(),
            admin_refresh_secret: "same".into(),
            user_secret: "same".into(),
            user_refresh_secret: "same".into(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        });

        let user = issuer.issue_user_pair(Uuid::new_v4(), "+51987654321").unwrap();
        let err = issuer.verify_admin_access(&user.access_token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_access_token_is_not_a_refresh_token() {
        let issuer = issuer();
        let pair = issuer.issue_user_pair(Uuid::new_v4(), "+51987654321").unwrap();
        assert!(issuer.verify_user_refresh(&pair.access_token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let issuer = TokenIssuer::new(&JwtConfig {
            admin_secret: "s1".into(),
            admin_refresh_secret: "s2".into(),
            user_secret: "s3".into(),
            user_refresh_secret: "s4".into(),
            // Beyond the default 60s validation leeway
            access_token_expiry: -120,
            refresh_token_expiry: 604800,
        });

        let pair = issuer.issue_user_pair(Uuid::new_v4(), "+51987654321").unwrap();
        let err = issuer.verify_user_access(&pair.access_token).unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn test_tampered_token() {
        let issuer = issuer();
        let pair = issuer.issue_user_pair(Uuid::new_v4(), "+51987654321").unwrap();
        let mut tampered = pair.access_token.clone();
        tampered.push('x');
        let err = issuer.verify_user_access(&tampered).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
