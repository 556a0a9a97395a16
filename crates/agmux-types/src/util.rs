use chrono::Duration;

/// Compact human form of a duration: "42s", "3m05s", "1h02m"
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h{:02}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m{:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_magnitude() {
        assert_eq!(format_duration(Duration::seconds(7)), "7s");
        assert_eq!(format_duration(Duration::seconds(185)), "3m05s");
        assert_eq!(format_duration(Duration::seconds(3720)), "1h02m");
        assert_eq!(format_duration(Duration::seconds(-4)), "0s");
    }
}
