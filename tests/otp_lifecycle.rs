//! End-to-end lifecycle tests for the OTP/session engine.
//!
//! Everything runs against the library with an explicit clock, so the
//! timing properties are exact rather than sleep-based.

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use secrecy::SecretString;
use std::sync::Arc;

use galerio::api::email::LogOtpSender;
use galerio::api::handlers::auth::{AuthConfig, AuthState, AuthenticateError};
use galerio::otp::{RequestError, VerifyError};

fn auth_state() -> Arc<AuthState> {
    Arc::new(
        AuthState::new(
            AuthConfig::new("https://gallery.test".to_string()),
            &SecretString::from("0123456789abcdef0123456789abcdef"),
            Arc::new(LogOtpSender),
        )
        .expect("auth state"),
    )
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

/// A code that is guaranteed not to match `issued`.
fn wrong_code(issued: &str) -> &'static str {
    if issued == "000000" { "000001" } else { "000000" }
}

#[tokio::test]
async fn three_sends_per_window_then_rate_limited() -> Result<()> {
    let state = auth_state();
    let engine = state.engine();
    let start = t0();

    for i in 0..3 {
        engine
            .request_challenge("a@b.com", start + Duration::minutes(i))
            .await?;
    }

    match engine
        .request_challenge("a@b.com", start + Duration::minutes(5))
        .await
    {
        Err(RequestError::RateLimited {
            retry_after_seconds,
        }) => {
            // Oldest send was at start; it leaves the window at +15min.
            assert_eq!(retry_after_seconds, 10 * 60);
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }

    // Once the oldest send ages out, a fourth send goes through.
    engine
        .request_challenge("a@b.com", start + Duration::minutes(15) + Duration::seconds(1))
        .await?;
    Ok(())
}

#[tokio::test]
async fn rate_limit_is_per_identity() -> Result<()> {
    let state = auth_state();
    let engine = state.engine();

    for _ in 0..3 {
        engine.request_challenge("busy@b.com", t0()).await?;
    }
    assert!(matches!(
        engine.request_challenge("busy@b.com", t0()).await,
        Err(RequestError::RateLimited { .. })
    ));
    // An unrelated identity is not throttled.
    engine.request_challenge("idle@b.com", t0()).await?;
    Ok(())
}

#[tokio::test]
async fn challenge_expires_at_five_minutes() -> Result<()> {
    let state = auth_state();
    let engine = state.engine();

    // Usable just before the deadline.
    let issued = engine.request_challenge("a@b.com", t0()).await?;
    engine
        .verify(
            "a@b.com",
            &issued.code,
            t0() + Duration::minutes(5) - Duration::seconds(1),
        )
        .await?;

    // Dead just past it.
    let issued = engine
        .request_challenge("a@b.com", t0() + Duration::minutes(10))
        .await?;
    assert!(matches!(
        engine
            .verify(
                "a@b.com",
                &issued.code,
                t0() + Duration::minutes(15) + Duration::seconds(1),
            )
            .await,
        Err(VerifyError::Expired)
    ));
    Ok(())
}

#[tokio::test]
async fn exactly_three_wrong_attempts_exhaust_the_challenge() -> Result<()> {
    let state = auth_state();
    let engine = state.engine();
    let issued = engine.request_challenge("a@b.com", t0()).await?;
    let wrong = wrong_code(&issued.code);

    assert!(matches!(
        engine.verify("a@b.com", wrong, t0()).await,
        Err(VerifyError::InvalidCode { attempts_left: 2 })
    ));
    assert!(matches!(
        engine.verify("a@b.com", wrong, t0()).await,
        Err(VerifyError::InvalidCode { attempts_left: 1 })
    ));
    // Third wrong attempt exhausts and clears.
    assert!(matches!(
        engine.verify("a@b.com", wrong, t0()).await,
        Err(VerifyError::InvalidCode { attempts_left: 0 })
    ));
    // The challenge is gone, so the fourth attempt is NoPendingChallenge,
    // not a repeated exhaustion error.
    assert!(matches!(
        engine.verify("a@b.com", &issued.code, t0()).await,
        Err(VerifyError::NoPendingChallenge)
    ));
    Ok(())
}

#[tokio::test]
async fn correct_code_succeeds_on_any_remaining_attempt() -> Result<()> {
    let state = auth_state();
    let engine = state.engine();

    for wrong_first in 0..3_i64 {
        let identity = format!("user{wrong_first}@b.com");
        let now = t0() + Duration::hours(wrong_first);
        let issued = engine.request_challenge(&identity, now).await?;
        for _ in 0..wrong_first {
            engine
                .verify(&identity, wrong_code(&issued.code), now)
                .await
                .unwrap_err();
        }
        let session = engine.verify(&identity, &issued.code, now).await?;
        assert_eq!(session.claims.sub, identity);

        // Replaying the consumed code fails.
        assert!(matches!(
            engine.verify(&identity, &issued.code, now).await,
            Err(VerifyError::NoPendingChallenge)
        ));
    }
    Ok(())
}

#[tokio::test]
async fn token_lives_thirty_minutes() -> Result<()> {
    let state = auth_state();
    let issued = state.engine().request_challenge("a@b.com", t0()).await?;
    let session = state.engine().verify("a@b.com", &issued.code, t0()).await?;

    // Accepted up to the embedded deadline.
    state.authenticate(&session.token, t0() + Duration::minutes(30))?;
    // Rejected after it.
    assert_eq!(
        state.authenticate(
            &session.token,
            t0() + Duration::minutes(30) + Duration::seconds(1)
        ),
        Err(AuthenticateError::Expired)
    );
    Ok(())
}

#[tokio::test]
async fn logout_takes_effect_before_natural_expiry() -> Result<()> {
    let state = auth_state();
    let issued = state.engine().request_challenge("a@b.com", t0()).await?;
    let session = state.engine().verify("a@b.com", &issued.code, t0()).await?;

    state.authenticate(&session.token, t0() + Duration::seconds(1))?;
    state.logout(&session.token, t0() + Duration::seconds(2));
    assert_eq!(
        state.authenticate(&session.token, t0() + Duration::seconds(3)),
        Err(AuthenticateError::Revoked)
    );

    // Logging out again, or with junk, stays a no-op.
    state.logout(&session.token, t0() + Duration::seconds(4));
    state.logout("junk", t0() + Duration::seconds(4));
    Ok(())
}

#[tokio::test]
async fn tampered_token_is_malformed_not_expired() -> Result<()> {
    let state = auth_state();
    let issued = state.engine().request_challenge("a@b.com", t0()).await?;
    let session = state.engine().verify("a@b.com", &issued.code, t0()).await?;

    let mut tampered = session.token.clone();
    tampered.pop();
    assert_eq!(
        state.authenticate(&tampered, t0()),
        Err(AuthenticateError::Malformed)
    );
    Ok(())
}

#[tokio::test]
async fn racing_last_attempt_produces_exactly_one_session() -> Result<()> {
    let state = auth_state();
    let issued = state.engine().request_challenge("a@b.com", t0()).await?;

    // Burn two attempts, leaving one.
    let wrong = wrong_code(&issued.code);
    state.engine().verify("a@b.com", wrong, t0()).await.unwrap_err();
    state.engine().verify("a@b.com", wrong, t0()).await.unwrap_err();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let state = Arc::clone(&state);
        let code = issued.code.clone();
        tasks.push(tokio::spawn(async move {
            state.engine().verify("a@b.com", &code, t0()).await
        }));
    }

    let mut successes = 0;
    for task in tasks {
        if task.await?.is_ok() {
            successes += 1;
        }
    }
    // The correct code can be spent at most once; losers observe the
    // cleared challenge rather than a stale counter.
    assert_eq!(successes, 1);
    Ok(())
}

#[tokio::test]
async fn spec_walkthrough_scenario() -> Result<()> {
    // request at t=0, verify the code at t=299s, token good until t+30min,
    // and the consumed code never matches a later challenge.
    let state = auth_state();
    let engine = state.engine();

    let issued = engine.request_challenge("a@b.com", t0()).await?;
    let session = engine
        .verify("a@b.com", &issued.code, t0() + Duration::seconds(299))
        .await?;

    state.authenticate(
        &session.token,
        t0() + Duration::seconds(299) + Duration::minutes(29),
    )?;

    // A fresh request at t=300 replaces the (already consumed) challenge.
    let fresh = engine
        .request_challenge("a@b.com", t0() + Duration::seconds(300))
        .await?;
    let replay = engine
        .verify("a@b.com", &issued.code, t0() + Duration::seconds(301))
        .await;
    match replay {
        Err(VerifyError::InvalidCode { .. }) | Err(VerifyError::NoPendingChallenge) => {}
        Ok(_) => {
            // Only legitimate if the fresh code happens to collide.
            assert_eq!(issued.code, fresh.code);
        }
        Err(other) => panic!("unexpected outcome: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn replaced_challenge_still_counts_against_the_send_window() -> Result<()> {
    let state = auth_state();
    let engine = state.engine();

    // Replacement does not refund sends: three requests fill the window
    // even though only the last challenge is alive.
    for i in 0..3 {
        engine
            .request_challenge("a@b.com", t0() + Duration::seconds(i))
            .await?;
    }
    assert!(matches!(
        engine
            .request_challenge("a@b.com", t0() + Duration::seconds(3))
            .await,
        Err(RequestError::RateLimited { .. })
    ));
    Ok(())
}
