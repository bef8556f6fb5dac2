use chrono::{NaiveTime, Timelike};
use serde_json::json;

use crate::error::{AppError, AppResult};

pub const MINUTES_PER_DAY: i64 = 24 * 60;

pub fn minutes_from_midnight(time: NaiveTime) -> i64 {
    (time.hour() as i64) * 60 + (time.minute() as i64)
}

pub fn to_naive_time(total_minutes: i64) -> AppResult<NaiveTime> {
    if !(0..MINUTES_PER_DAY).contains(&total_minutes) {
        return Err(AppError::internal(format!(
            "时间计算越过当日边界: {total_minutes} 分钟"
        )));
    }
    let hours = (total_minutes / 60) as u32;
    let minutes = (total_minutes % 60) as u32;
    NaiveTime::from_hms_opt(hours, minutes, 0)
        .ok_or_else(|| AppError::internal(format!("无效的时间: {hours}:{minutes:02}")))
}

/// Add minutes to a time-of-day. Crossing midnight is an error: the engine
/// never schedules past the end of a calendar day.
pub fn add_minutes(time: NaiveTime, minutes: i64) -> AppResult<NaiveTime> {
    to_naive_time(minutes_from_midnight(time) + minutes)
}

pub fn duration_minutes(start: NaiveTime, end: NaiveTime) -> AppResult<i64> {
    let total = minutes_from_midnight(end) - minutes_from_midnight(start);
    if total < 0 {
        Err(AppError::invalid_constraints_with_details(
            "结束时间必须晚于开始时间",
            json!({
                "start": format_time(start),
                "end": format_time(end),
            }),
        ))
    } else {
        Ok(total)
    }
}

pub fn overlaps(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    a_start < b_end && b_start < a_end
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
