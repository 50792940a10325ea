use crate::{params::ConfigParams, Warning};
use ingress_controller_core::{JwtAuth, JwtRedirectLocation};
use ingress_controller_k8s_api::{ResolvedIngress, ResourceId};

pub(crate) fn redirect_location_name(owner: &ResourceId) -> String {
    format!("@login_url_{}", owner.file_name())
}

/// Builds JWT authentication for an Ingress that sets a JWT key, along with the redirect location
/// its login URL requires.
pub(crate) fn build(
    owner: &ResourceId,
    params: &ConfigParams,
    key_file: &str,
) -> Option<(JwtAuth, Option<JwtRedirectLocation>)> {
    params.jwt_key.as_ref()?;

    let redirect = params
        .jwt_login_url
        .as_ref()
        .map(|login_url| JwtRedirectLocation {
            name: redirect_location_name(owner),
            login_url: login_url.clone(),
        });
    let auth = JwtAuth {
        key: key_file.to_string(),
        realm: params.jwt_realm.clone(),
        token: params.jwt_token.clone(),
        redirect_location_name: redirect.as_ref().map(|r| r.name.clone()),
    };
    Some((auth, redirect))
}

/// Reports a resolved key secret that is not the one the Ingress names.
pub(crate) fn check_key(ingress: &ResolvedIngress, params: &ConfigParams) -> Option<Warning> {
    let annotated = params.jwt_key.as_ref()?;
    let resolved = ingress.jwt_key.as_ref()?;
    if resolved.name == *annotated {
        return None;
    }
    Some(Warning::JwtKeyMismatch {
        annotated: annotated.clone(),
        resolved: resolved.name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingress_controller_k8s_api::JwtKey;
    use pretty_assertions::assert_eq;

    fn cafe() -> ResourceId {
        ResourceId::new("default".to_string(), "cafe-ingress".to_string())
    }

    #[test]
    fn no_key_no_auth() {
        let params = ConfigParams {
            jwt_login_url: Some("https://login.example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(build(&cafe(), &params, "/etc/nginx/secrets/key"), None);
    }

    #[test]
    fn login_url_adds_redirect() {
        let params = ConfigParams {
            jwt_key: Some("cafe-jwk".to_string()),
            jwt_realm: "Cafe App".to_string(),
            jwt_token: "$cookie_auth_token".to_string(),
            jwt_login_url: Some("https://login.example.com".to_string()),
            ..Default::default()
        };
        let (auth, redirect) = build(&cafe(), &params, "/etc/nginx/secrets/key").unwrap();
        assert_eq!(
            auth,
            JwtAuth {
                key: "/etc/nginx/secrets/key".to_string(),
                realm: "Cafe App".to_string(),
                token: "$cookie_auth_token".to_string(),
                redirect_location_name: Some("@login_url_default-cafe-ingress".to_string()),
            }
        );
        assert_eq!(
            redirect,
            Some(JwtRedirectLocation {
                name: "@login_url_default-cafe-ingress".to_string(),
                login_url: "https://login.example.com".to_string(),
            })
        );

        let params = ConfigParams {
            jwt_login_url: None,
            ..params
        };
        let (auth, redirect) = build(&cafe(), &params, "").unwrap();
        assert_eq!(auth.key, "");
        assert_eq!(auth.redirect_location_name, None);
        assert_eq!(redirect, None);
    }

    #[test]
    fn key_mismatch() {
        let params = ConfigParams {
            jwt_key: Some("cafe-jwk".to_string()),
            ..Default::default()
        };
        let mut ingress = ResolvedIngress::default();
        assert_eq!(check_key(&ingress, &params), None);

        ingress.jwt_key = Some(JwtKey {
            name: "cafe-jwk".to_string(),
            secret: None,
        });
        assert_eq!(check_key(&ingress, &params), None);

        ingress.jwt_key = Some(JwtKey {
            name: "tea-jwk".to_string(),
            secret: None,
        });
        assert_eq!(
            check_key(&ingress, &params),
            Some(Warning::JwtKeyMismatch {
                annotated: "cafe-jwk".to_string(),
                resolved: "tea-jwk".to_string(),
            })
        );
    }
}
