use crate::application_port::*;
use crate::domain_model::*;
use crate::logger::*;
use std::sync::Arc;

/// Authorizes requests against a fully verified access token.
pub struct JwtAccessGuard {
    signer: Arc<dyn TokenSigner>,
}

impl JwtAccessGuard {
    pub fn new(signer: Arc<dyn TokenSigner>) -> Self {
        Self { signer }
    }
}

impl AccessGuard for JwtAccessGuard {
    fn authorize(&self, token: &AccessToken, required_roles: &[Role]) -> Authorization {
        let payload = match self.signer.verify(token) {
            Ok(payload) => payload,
            Err(TokenError::Expired) => return Authorization::Deny(DenyReason::Expired),
            Err(e) => {
                debug!(error = %e, "access token rejected");
                return Authorization::Deny(DenyReason::Invalid(e));
            }
        };

        if required_roles.contains(&payload.role) {
            Authorization::Allow(payload)
        } else {
            debug!(subject = %payload.subject_id, role = %payload.role, "role not permitted");
            Authorization::Deny(DenyReason::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{JwtConfig, JwtHs256Signer};
    use chrono::Utc;
    use std::time::Duration;

    fn signer(secret: &str) -> Arc<dyn TokenSigner> {
        Arc::new(JwtHs256Signer::new(JwtConfig {
            issuer: "tokengate.test".to_string(),
            audience: "test-client".to_string(),
            access_ttl: Duration::from_secs(600),
            signing_key: secret.as_bytes().to_vec(),
        }))
    }

    fn token_for(signer: &Arc<dyn TokenSigner>, role: Role) -> AccessToken {
        let grant = AccessGrant {
            subject_id: SubjectId("u1".to_string()),
            role,
        };
        signer.issue(&grant).unwrap().0
    }

    #[test]
    fn admin_presets() {
        let signer = signer("secret");
        let guard = JwtAccessGuard::new(signer.clone());

        let admin = token_for(&signer, Role::Admin);
        let super_admin = token_for(&signer, Role::SuperAdmin);
        let user = token_for(&signer, Role::User);

        assert!(matches!(guard.authorize(&admin, ONLY_ADMIN), Authorization::Allow(_)));
        assert_eq!(
            guard.authorize(&super_admin, ONLY_ADMIN),
            Authorization::Deny(DenyReason::Forbidden)
        );
        assert!(matches!(
            guard.authorize(&super_admin, ONLY_SUPER_ADMIN),
            Authorization::Allow(_)
        ));
        assert!(matches!(
            guard.authorize(&super_admin, ADMIN_AND_SUPER_ADMIN),
            Authorization::Allow(_)
        ));
        assert_eq!(
            guard.authorize(&user, ADMIN_AND_SUPER_ADMIN),
            Authorization::Deny(DenyReason::Forbidden)
        );
        assert!(matches!(guard.authorize(&user, ANY_ROLE), Authorization::Allow(_)));
    }

    #[test]
    fn forged_admin_token_is_invalid_not_allowed() {
        let guard = JwtAccessGuard::new(signer("secret"));
        let forged = token_for(&signer("attacker"), Role::SuperAdmin);

        assert_eq!(
            guard.authorize(&forged, ONLY_SUPER_ADMIN),
            Authorization::Deny(DenyReason::Invalid(TokenError::BadSignature))
        );
    }

    #[test]
    fn garbage_token_is_invalid_and_malformed() {
        let guard = JwtAccessGuard::new(signer("secret"));
        assert_eq!(
            guard.authorize(&AccessToken("not-a-jwt".to_string()), ANY_ROLE),
            Authorization::Deny(DenyReason::Invalid(TokenError::Malformed))
        );
    }

    #[test]
    fn expired_token_is_denied_before_role_check() {
        let signer = signer("secret");
        let guard = JwtAccessGuard::new(signer.clone());
        let grant = AccessGrant {
            subject_id: SubjectId("u1".to_string()),
            role: Role::User,
        };
        let (token, _) = signer
            .issue_at(&grant, Utc::now() - chrono::Duration::hours(1))
            .unwrap();

        assert_eq!(
            guard.authorize(&token, ONLY_ADMIN),
            Authorization::Deny(DenyReason::Expired)
        );
    }

    #[test]
    fn empty_role_set_forbids_everyone() {
        let signer = signer("secret");
        let guard = JwtAccessGuard::new(signer.clone());
        let token = token_for(&signer, Role::SuperAdmin);
        assert_eq!(
            guard.authorize(&token, &[]),
            Authorization::Deny(DenyReason::Forbidden)
        );
    }
}
