//! 请求主体 (从 JWT Claims 解析)

use shared::models::{PermissionMatrix, RoleId, UserId, UserIdentity};

use super::jwt::{Claims, JwtError};

/// Authenticated request principal
///
/// Created by the auth middleware and injected into handlers. `is_admin` and
/// `role_id` start as the token's cached values; the authorizer overwrites
/// them from the user store before every decision.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
    pub role_id: Option<RoleId>,
    /// Effective matrix attached after a successful permission check
    pub permissions: Option<PermissionMatrix>,
}

impl Principal {
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            is_admin: self.is_admin,
            role_id: self.role_id,
        }
    }
}

impl TryFrom<Claims> for Principal {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| JwtError::InvalidToken(format!("invalid subject: {}", claims.sub)))?;
        Ok(Self {
            id,
            username: claims.username,
            is_admin: claims.is_admin,
            role_id: claims.role_id,
            permissions: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            username: "bob".to_string(),
            is_admin: false,
            role_id: Some(2),
            token_type: "access".to_string(),
            exp: 0,
            iat: 0,
            iss: "asset-server".to_string(),
            aud: "asset-clients".to_string(),
        }
    }

    #[test]
    fn test_principal_from_claims() {
        let principal = Principal::try_from(claims("12")).unwrap();
        assert_eq!(principal.id, 12);
        assert_eq!(principal.identity(), UserIdentity::with_role(2));
        assert!(principal.permissions.is_none());
    }

    #[test]
    fn test_non_numeric_subject_is_rejected() {
        assert!(Principal::try_from(claims("abc")).is_err());
    }
}
