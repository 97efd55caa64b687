use chrono::{DateTime, Local};

/// Render a `seconds.micros` message timestamp in local time.
pub fn format_ts(ts: &str) -> String {
    let secs = ts.split('.').next().unwrap_or(ts);
    let Ok(secs) = secs.parse::<i64>() else {
        return ts.to_string();
    };

    match DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ts.to_string(),
    }
}

/// Author column: display name when resolved, else the user ID.
pub fn author(user: &str, user_name: &str) -> String {
    if user_name.is_empty() {
        user.to_string()
    } else {
        user_name.to_string()
    }
}
