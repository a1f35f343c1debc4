use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::cmp::{max, min};

use crate::domain::models::{provider::Provider, service::ServiceOffering, slot::Slot};
use crate::domain::services::availability::LocalInterval;

const TOTAL_MINUTES: usize = 1440;

/// Buffered range of an active booking or unexpired hold, as seen by
/// occupancy accounting.
#[derive(Debug, Clone, Copy)]
pub struct OccupiedRange {
    pub block_start: DateTime<Utc>,
    pub block_end: DateTime<Utc>,
}

/// Derives the candidate slots for one provider-local day.
///
/// Pure function of its inputs: the ledger remains the sole authority on
/// capacity, so a slot listed here can still lose the race at hold time.
/// A slot `[t, t+duration)` is emitted when it fits the window with its
/// trailing buffer, resolves to an unambiguous local instant, starts after
/// the provider's notice cutoff, and every minute of the candidate range
/// sees fewer than `effective_capacity` overlapping occupants.
pub fn generate_slots(
    provider: &Provider,
    service: &ServiceOffering,
    date: NaiveDate,
    local_windows: &[LocalInterval],
    occupied: &[OccupiedRange],
    granularity_min: u32,
    now: DateTime<Utc>,
) -> Vec<Slot> {
    let tz: Tz = provider.timezone.parse().unwrap_or(chrono_tz::UTC);

    let duration_min = service.duration_min as usize;
    let buffer_after = service.buffer_after_min as usize;
    let step = if granularity_min == 0 { duration_min } else { granularity_min as usize };
    if duration_min == 0 || step == 0 {
        return Vec::new();
    }

    let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
        return Vec::new();
    };
    let Some(day_start_tz) = tz.from_local_datetime(&midnight).earliest() else {
        return Vec::new();
    };
    let day_start_utc = day_start_tz.with_timezone(&Utc);
    let day_end_utc = day_start_utc + Duration::minutes(TOTAL_MINUTES as i64);

    let mut minute_counts = [0u8; TOTAL_MINUTES];
    for range in occupied {
        let start = max(range.block_start, day_start_utc);
        let end = min(range.block_end, day_end_utc);
        if start < end {
            let s_idx = (start - day_start_utc).num_minutes().clamp(0, TOTAL_MINUTES as i64) as usize;
            let e_idx = (end - day_start_utc).num_minutes().clamp(0, TOTAL_MINUTES as i64) as usize;
            for count in &mut minute_counts[s_idx..e_idx] {
                *count = count.saturating_add(1);
            }
        }
    }

    let capacity = provider.effective_capacity();
    let cutoff = now + Duration::minutes(provider.min_notice_min as i64);

    let mut valid_slots: Vec<Slot> = Vec::new();
    for (win_start, win_end) in local_windows {
        let win_start_idx = (win_start.hour() * 60 + win_start.minute()) as usize;
        let mut win_end_idx = (win_end.hour() * 60 + win_end.minute()) as usize;
        if win_end_idx == 1439 {
            win_end_idx = 1440;
        }

        let mut cursor = win_start_idx;
        while cursor + duration_min + buffer_after <= win_end_idx {
            let hour = (cursor / 60) as u32;
            let minute = (cursor % 60) as u32;

            // DST-skipped or ambiguous wall times are not offered.
            if let Some(nt) = NaiveTime::from_hms_opt(hour, minute, 0) {
                if let Some(slot_tz) = tz.from_local_datetime(&date.and_time(nt)).single() {
                    let slot_utc = slot_tz.with_timezone(&Utc);
                    let slot_end_utc = slot_utc + Duration::minutes(duration_min as i64);

                    let s_idx = (slot_utc - day_start_utc).num_minutes().clamp(0, TOTAL_MINUTES as i64) as usize;
                    let e_idx = (slot_end_utc - day_start_utc).num_minutes().clamp(0, TOTAL_MINUTES as i64) as usize;

                    let mut is_capacity_ok = true;
                    for count in &minute_counts[s_idx..e_idx] {
                        if *count as i64 >= capacity {
                            is_capacity_ok = false;
                            break;
                        }
                    }

                    if slot_utc >= cutoff && is_capacity_ok {
                        valid_slots.push(Slot {
                            provider_id: provider.id.clone(),
                            service_id: service.id.clone(),
                            start: slot_utc,
                            end: slot_end_utc,
                        });
                    }
                }
            }
            cursor += step;
        }
    }

    valid_slots.sort_by_key(|s| s.start);
    valid_slots.dedup_by_key(|s| s.start);
    valid_slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::provider::Provider;

    fn utc_provider(base_capacity: i32, overbooking_pct: f64) -> Provider {
        Provider::new("Ana".into(), "UTC".into(), vec!["hair".into()], base_capacity, overbooking_pct, 0)
    }

    fn service(duration: i32, before: i32, after: i32) -> ServiceOffering {
        ServiceOffering::new("Cut".into(), duration, before, after, "hair".into(), 5000)
    }

    fn t(raw: &str) -> NaiveTime {
        NaiveTime::parse_from_str(raw, "%H:%M").unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn at(hhmm: &str) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date().and_time(t(hhmm)))
    }

    fn long_ago() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_three_hour_window_yields_three_hour_slots() {
        let provider = utc_provider(1, 0.0);
        let svc = service(60, 0, 0);
        let slots = generate_slots(&provider, &svc, date(), &[(t("09:00"), t("12:00"))], &[], 0, long_ago());

        let starts: Vec<_> = slots.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![at("09:00"), at("10:00"), at("11:00")]);
    }

    #[test]
    fn test_existing_booking_consumes_slot() {
        let provider = utc_provider(1, 0.0);
        let svc = service(60, 0, 0);
        let occupied = [OccupiedRange { block_start: at("10:00"), block_end: at("11:00") }];
        let slots = generate_slots(&provider, &svc, date(), &[(t("09:00"), t("12:00"))], &occupied, 0, long_ago());

        let starts: Vec<_> = slots.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![at("09:00"), at("11:00")]);
    }

    #[test]
    fn test_overbooking_allowance_keeps_slot_open() {
        // base 1 + 100% overbooking = 2 occupants per interval
        let provider = utc_provider(1, 1.0);
        let svc = service(60, 0, 0);
        let occupied = [OccupiedRange { block_start: at("10:00"), block_end: at("11:00") }];
        let slots = generate_slots(&provider, &svc, date(), &[(t("09:00"), t("12:00"))], &occupied, 0, long_ago());
        assert_eq!(slots.len(), 3);

        let full = [
            OccupiedRange { block_start: at("10:00"), block_end: at("11:00") },
            OccupiedRange { block_start: at("10:00"), block_end: at("11:00") },
        ];
        let slots = generate_slots(&provider, &svc, date(), &[(t("09:00"), t("12:00"))], &full, 0, long_ago());
        let starts: Vec<_> = slots.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![at("09:00"), at("11:00")]);
    }

    #[test]
    fn test_trailing_buffer_trims_last_slot() {
        let provider = utc_provider(1, 0.0);
        let svc = service(60, 0, 15);
        let slots = generate_slots(&provider, &svc, date(), &[(t("09:00"), t("12:00"))], &[], 0, long_ago());

        // 11:00 would need cleanup until 12:15, past the window end.
        let starts: Vec<_> = slots.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![at("09:00"), at("10:00")]);
    }

    #[test]
    fn test_buffered_neighbour_blocks_adjacent_slot() {
        let provider = utc_provider(1, 0.0);
        let svc = service(60, 0, 0);
        // A 10:00-11:00 booking whose service carries a 15-minute buffer on both sides.
        let occupied = [OccupiedRange { block_start: at("09:45"), block_end: at("11:15") }];
        let slots = generate_slots(&provider, &svc, date(), &[(t("09:00"), t("12:00"))], &occupied, 0, long_ago());
        assert!(slots.is_empty(), "every hourly candidate touches the buffered range: {:?}", slots);
    }

    #[test]
    fn test_notice_cutoff_hides_near_slots() {
        let provider = Provider::new("Ana".into(), "UTC".into(), vec!["hair".into()], 1, 0.0, 60);
        let svc = service(60, 0, 0);
        let now = at("08:30");
        let slots = generate_slots(&provider, &svc, date(), &[(t("09:00"), t("12:00"))], &[], 0, now);

        // 09:00 is inside the 60-minute notice period.
        let starts: Vec<_> = slots.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![at("10:00"), at("11:00")]);
    }

    #[test]
    fn test_granularity_overrides_duration_step() {
        let provider = utc_provider(1, 0.0);
        let svc = service(60, 0, 0);
        let slots = generate_slots(&provider, &svc, date(), &[(t("09:00"), t("11:00"))], &[], 30, long_ago());

        let starts: Vec<_> = slots.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![at("09:00"), at("09:30"), at("10:00")]);
    }
}
