//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use chrono::{DateTime, Utc};

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Formats a timestamp as relative time, e.g. "just now", "5m ago", "3d ago".
///
/// Usage in templates: `{{ idea.created_at|relative_time }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn relative_time(
    timestamp: &DateTime<Utc>,
    _env: &dyn askama::Values,
) -> askama::Result<String> {
    Ok(format_relative(*timestamp, Utc::now()))
}

/// Maps an error slug from a redirect query to its banner message.
///
/// Usage in templates: `{{ error|error_message }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn error_message(slug: &str, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(describe_error(slug))
}

/// Maps a success slug from a redirect query to its banner message.
///
/// Usage in templates: `{{ success|success_message }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn success_message(slug: &str, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(describe_success(slug))
}

/// Banner text for each error slug used in redirect URLs.
fn describe_error(slug: &str) -> &'static str {
    match slug {
        "email_taken" => "An account with that email already exists.",
        "username_taken" => "That username is taken.",
        "weak_password" => "Password must be at least 8 characters.",
        "invalid_email" => "That email address doesn't look right.",
        "invalid_username" => "Usernames are 3-30 characters: letters, numbers, - and _.",
        "signup_failed" => "Sign-up failed. Please try again.",
        "credentials" => "Invalid email or password.",
        "session" => "Your session couldn't be saved. Please try again.",
        "invalid_role" | "role_failed" => "Couldn't set your role. Please try again.",
        "creators_only" => "Only creators can do that. Pick the creator role to publish ideas.",
        "premium_required" => "Partnership mode requires a premium plan.",
        "missing_fields" => "Please fill in all required fields.",
        "invalid_mode" => "Pick a valid ownership mode.",
        "empty_comment" => "Comments can't be empty.",
        "remix_protected" => "This idea's details are protected, so it can't be remixed.",
        "not_purchasable" => "This idea isn't available to buy.",
        "checkout_failed" => "Couldn't start checkout. Please try again.",
        "checkout_canceled" => "Checkout was canceled.",
        "not_partnership" => "This idea isn't open for partnership.",
        "own_idea" => "You can't partner on your own idea.",
        "start_over" => "That step expired. Please start the partnership request again.",
        "unsupported_type" => "Avatars must be a PNG, JPEG, WebP, or GIF image.",
        "file_too_large" => "That file is too large. Avatars are capped at 5 MB.",
        "no_file" => "Choose an image file to upload.",
        "invalid_plan" => "Pick a valid plan.",
        "invalid_amount" => "Enter a valid dollar amount.",
        "minimum" => "Withdrawals start at $10.00.",
        "insufficient_balance" => "Your balance doesn't cover that withdrawal.",
        "payouts_unavailable" => "Payout onboarding isn't available right now.",
        "payout_failed" => "Couldn't start payout setup. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Banner text for each success slug used in redirect URLs.
fn describe_success(slug: &str) -> &'static str {
    match slug {
        "published" => "Your idea is live.",
        "updated" => "Idea updated.",
        "idea_deleted" => "Idea deleted.",
        "partnership_sent" => "Partnership request sent. The creator has been notified.",
        "profile_updated" => "Profile updated.",
        "avatar_updated" => "Avatar updated.",
        "withdrawal_requested" => "Withdrawal requested. Funds arrive in 3-5 business days.",
        "payout_setup" => "Payout details saved. You can withdraw once Stripe verifies them.",
        "plan_purchased" => "Payment received. Your premium perks are unlocking now.",
        _ => "Done.",
    }
}

/// Render the distance between `then` and `now` in coarse units.
fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);

    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }

    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("{hours}h ago");
    }

    let days = elapsed.num_days();
    if days < 30 {
        return format!("{days}d ago");
    }

    // Beyond a month, show the date
    then.format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_relative_buckets() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();

        let just_now = now - chrono::Duration::seconds(30);
        assert_eq!(format_relative(just_now, now), "just now");

        let minutes = now - chrono::Duration::minutes(5);
        assert_eq!(format_relative(minutes, now), "5m ago");

        let hours = now - chrono::Duration::hours(3);
        assert_eq!(format_relative(hours, now), "3h ago");

        let days = now - chrono::Duration::days(6);
        assert_eq!(format_relative(days, now), "6d ago");
    }

    #[test]
    fn test_format_relative_old_dates_show_date() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();

        assert_eq!(format_relative(old, now), "Jan 2, 2024");
    }

    #[test]
    fn test_describe_error_known_and_unknown_slugs() {
        assert_eq!(describe_error("credentials"), "Invalid email or password.");
        assert_eq!(
            describe_error("made_up_slug"),
            "Something went wrong. Please try again."
        );
    }

    #[test]
    fn test_describe_success_known_and_unknown_slugs() {
        assert_eq!(describe_success("updated"), "Idea updated.");
        assert_eq!(describe_success("made_up_slug"), "Done.");
    }
}
