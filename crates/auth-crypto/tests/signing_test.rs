use auth_crypto::JwtService;
use chrono::{Duration, Utc};
use uuid::Uuid;

#[test]
fn encode_then_validate_recovers_the_login() {
    let service = JwtService::new("integration-test-secret".to_string());
    let login = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::minutes(30);

    let jwt = service.encode(login, expires_at).expect("encode failed");
    let claims = service.validate(&jwt).expect("validate failed");

    assert_eq!(claims.login, login);
}

#[test]
fn a_token_signed_with_one_secret_does_not_validate_under_another() {
    let issuer = JwtService::new("secret-a".to_string());
    let verifier = JwtService::new("secret-b".to_string());

    let jwt = issuer
        .encode(Uuid::new_v4(), Utc::now() + Duration::minutes(30))
        .expect("encode failed");

    assert!(verifier.validate(&jwt).is_err());
}
