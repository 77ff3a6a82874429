mod login;
mod logout;
mod me;
mod signup;

use std::num::NonZeroU32;

use axum::{
    Router,
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::RngCore;
use ring::pbkdf2;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup::signup))
        .route("/login", post(login::login))
        .route("/logout", post(logout::logout))
        .route("/me", get(me::me))
}

const PBKDF2_ITERATIONS: NonZeroU32 = NonZeroU32::new(120_000).unwrap();

pub(crate) fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::rng().fill_bytes(&mut salt);

    let mut derived = [0u8; 32];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        PBKDF2_ITERATIONS,
        &salt,
        password.as_bytes(),
        &mut derived,
    );

    format!("{}${}", STANDARD.encode(salt), STANDARD.encode(derived))
}

pub(crate) fn verify_password(stored: &str, password: &str) -> bool {
    let Some((salt, derived)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(derived)) = (STANDARD.decode(salt), STANDARD.decode(derived)) else {
        return false;
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        PBKDF2_ITERATIONS,
        &salt,
        password.as_bytes(),
        &derived,
    )
    .is_ok()
}
