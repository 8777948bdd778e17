//! Milestone gating and unloading time

use chrono::{DateTime, Duration, Utc};

use crate::{
    error::{AppError, AppResult},
    models::deployment::Timeline,
};

/// One of the five sequential timeline fields, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Milestone {
    Departed,
    PickupIn,
    PickupOut,
    DestArrival,
    DestDeparture,
}

impl Milestone {
    pub const ALL: [Milestone; 5] = [
        Milestone::Departed,
        Milestone::PickupIn,
        Milestone::PickupOut,
        Milestone::DestArrival,
        Milestone::DestDeparture,
    ];

    pub fn field(&self) -> &'static str {
        match self {
            Milestone::Departed => "departed",
            Milestone::PickupIn => "pickup_in",
            Milestone::PickupOut => "pickup_out",
            Milestone::DestArrival => "dest_arrival",
            Milestone::DestDeparture => "dest_departure",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Milestone::Departed => "Departed",
            Milestone::PickupIn => "Pickup in",
            Milestone::PickupOut => "Pickup out",
            Milestone::DestArrival => "Destination arrival",
            Milestone::DestDeparture => "Destination departure",
        }
    }

    /// The milestone that must be set before this one
    pub fn predecessor(&self) -> Option<Milestone> {
        match self {
            Milestone::Departed => None,
            Milestone::PickupIn => Some(Milestone::Departed),
            Milestone::PickupOut => Some(Milestone::PickupIn),
            Milestone::DestArrival => Some(Milestone::PickupOut),
            Milestone::DestDeparture => Some(Milestone::DestArrival),
        }
    }

    pub fn get(&self, timeline: &Timeline) -> Option<DateTime<Utc>> {
        match self {
            Milestone::Departed => timeline.departed,
            Milestone::PickupIn => timeline.pickup_in,
            Milestone::PickupOut => timeline.pickup_out,
            Milestone::DestArrival => timeline.dest_arrival,
            Milestone::DestDeparture => timeline.dest_departure,
        }
    }
}

/// Whether `milestone` may be edited given the current timeline
pub fn is_editable(timeline: &Timeline, milestone: Milestone) -> bool {
    match milestone.predecessor() {
        None => true,
        Some(prev) => prev.get(timeline).is_some(),
    }
}

/// Check that every set milestone has its predecessor set and is not earlier
/// than it.
pub fn validate_timeline(timeline: &Timeline) -> AppResult<()> {
    for milestone in Milestone::ALL {
        let Some(at) = milestone.get(timeline) else {
            continue;
        };
        let Some(prev) = milestone.predecessor() else {
            continue;
        };
        if !is_editable(timeline, milestone) {
            return Err(AppError::Validation(format!(
                "{} cannot be set before {}",
                milestone.field(),
                prev.field()
            )));
        }
        if let Some(prev_at) = prev.get(timeline).filter(|prev_at| at < *prev_at) {
            return Err(AppError::Validation(format!(
                "{} ({}) is earlier than {} ({})",
                milestone.field(),
                at.to_rfc3339(),
                prev.field(),
                prev_at.to_rfc3339()
            )));
        }
    }
    Ok(())
}

/// Milestones whose value differs between two timelines, with the new value
pub fn changed_milestones(
    before: &Timeline,
    after: &Timeline,
) -> Vec<(Milestone, Option<DateTime<Utc>>)> {
    Milestone::ALL
        .into_iter()
        .filter(|m| m.get(before) != m.get(after))
        .map(|m| (m, m.get(after)))
        .collect()
}

/// Time between destination arrival and departure, when both are known
pub fn unloading_duration(timeline: &Timeline) -> Option<Duration> {
    match (timeline.dest_arrival, timeline.dest_departure) {
        (Some(arrival), Some(departure)) => Some((departure - arrival).abs()),
        _ => None,
    }
}

/// Unloading time for display: "2d 3h 5m", "1h 30m", "45m" or "Pending"
pub fn unloading_time(timeline: &Timeline) -> String {
    unloading_duration(timeline)
        .map(format_duration)
        .unwrap_or_else(|| "Pending".to_string())
}

pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().abs();
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes % (24 * 60)) / 60;
    let minutes = total_minutes % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
    }

    fn full_timeline() -> Timeline {
        Timeline {
            departed: Some(at(6, 0)),
            pickup_in: Some(at(7, 0)),
            pickup_out: Some(at(8, 15)),
            dest_arrival: Some(at(10, 0)),
            dest_departure: Some(at(11, 30)),
        }
    }

    #[test]
    fn unloading_time_in_hours_and_minutes() {
        assert_eq!(unloading_time(&full_timeline()), "1h 30m");
    }

    #[test]
    fn unloading_time_pending_without_departure() {
        let timeline = Timeline {
            dest_departure: None,
            ..full_timeline()
        };
        assert_eq!(unloading_time(&timeline), "Pending");
        assert_eq!(unloading_time(&Timeline::default()), "Pending");
    }

    #[test]
    fn unloading_time_formats_by_magnitude() {
        assert_eq!(format_duration(Duration::minutes(45)), "45m");
        assert_eq!(format_duration(Duration::minutes(0)), "0m");
        assert_eq!(format_duration(Duration::minutes(60)), "1h 0m");
        assert_eq!(format_duration(Duration::hours(24)), "1d 0h 0m");
        assert_eq!(format_duration(Duration::minutes(2 * 24 * 60 + 3 * 60 + 5)), "2d 3h 5m");
    }

    #[test]
    fn unloading_time_uses_absolute_delta() {
        let timeline = Timeline {
            dest_arrival: Some(at(11, 30)),
            dest_departure: Some(at(10, 0)),
            ..Timeline::default()
        };
        assert_eq!(unloading_time(&timeline), "1h 30m");
    }

    #[test]
    fn complete_sequential_timeline_is_valid() {
        assert!(validate_timeline(&full_timeline()).is_ok());
        assert!(validate_timeline(&Timeline::default()).is_ok());
    }

    #[test]
    fn pickup_out_before_pickup_in_is_rejected() {
        let timeline = Timeline {
            departed: Some(at(6, 0)),
            pickup_out: Some(at(8, 0)),
            ..Timeline::default()
        };
        match validate_timeline(&timeline) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("pickup_out")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn clearing_a_milestone_with_a_set_successor_is_rejected() {
        let timeline = Timeline {
            pickup_in: None,
            ..full_timeline()
        };
        assert!(validate_timeline(&timeline).is_err());
    }

    #[test]
    fn milestone_earlier_than_predecessor_is_rejected() {
        let timeline = Timeline {
            departed: Some(at(9, 0)),
            pickup_in: Some(at(8, 0)),
            ..Timeline::default()
        };
        assert!(validate_timeline(&timeline).is_err());
    }

    #[test]
    fn equal_consecutive_timestamps_are_accepted() {
        let timeline = Timeline {
            departed: Some(at(9, 0)),
            pickup_in: Some(at(9, 0)),
            ..Timeline::default()
        };
        assert!(validate_timeline(&timeline).is_ok());
    }

    #[test]
    fn only_the_next_milestone_becomes_editable() {
        let timeline = Timeline {
            departed: Some(at(6, 0)),
            ..Timeline::default()
        };
        let editable: Vec<Milestone> = Milestone::ALL
            .into_iter()
            .filter(|m| is_editable(&timeline, *m))
            .collect();
        assert_eq!(editable, vec![Milestone::Departed, Milestone::PickupIn]);
    }

    #[test]
    fn changed_milestones_reports_new_values() {
        let before = Timeline {
            departed: Some(at(6, 0)),
            ..Timeline::default()
        };
        let after = Timeline {
            pickup_in: Some(at(7, 0)),
            ..before
        };
        assert_eq!(
            changed_milestones(&before, &after),
            vec![(Milestone::PickupIn, Some(at(7, 0)))]
        );
    }
}
