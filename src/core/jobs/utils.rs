use crate::core::jobs::JobError;

/// Parse a wall-time in format "H:MM" or "HH:MM" into (hours, minutes).
/// Hours are unbounded since scheduler limits often exceed a day.
pub fn parse_walltime(time_str: &str) -> Result<(u32, u32), JobError> {
  let invalid = || JobError::InvalidTimeFormat(time_str.to_string());

  let (hours, minutes) = time_str.trim().split_once(':').ok_or_else(invalid)?;
  let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
  if !all_digits(hours) || !all_digits(minutes) || minutes.len() != 2 {
    return Err(invalid());
  }
  let hours: u32 = hours.parse().map_err(|_| invalid())?;
  let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
  if minutes >= 60 || (hours == 0 && minutes == 0) {
    return Err(invalid());
  }
  Ok((hours, minutes))
}

/// Quotes a string for `sh` by wrapping it in single quotes.
pub fn shell_quote(s: &str) -> String {
  let mut result = String::with_capacity(s.len() + 2);
  result.push('\'');
  for ch in s.chars() {
    match ch {
      // End the quoted string, add an escaped quote, start a new one
      '\'' => result.push_str("'\\''"),
      _ => result.push(ch),
    }
  }
  result.push('\'');
  result
}
