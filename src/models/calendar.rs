//! Weekly calendar grid.
//!
//! Defines which teaching slots exist in a school week, their clock
//! times, and which of them are reserved.
//!
//! # Grid Model
//! A slot is (day, session, period). Period numbers run continuously
//! through the day: morning periods are `1..=m`, afternoon periods are
//! `m+1..=m+a`. So (day, period) alone identifies a slot.
//!
//! # Precedence
//! A slot listed as unavailable is never used. A fixed slot (flag
//! ceremony, homeroom activity) is never handed to the subject pass.
//! Everything else is regular.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::CalendarError;

/// School day. The week runs Monday through Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl Weekday {
    /// All school days in week order.
    pub const ALL: [Weekday; 6] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ];
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
        };
        f.write_str(name)
    }
}

/// Half of a school day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Session {
    Morning,
    Afternoon,
}

/// One schedulable unit of the weekly grid.
///
/// Ordering is day, then session, then period, which is the scan order
/// used by the placement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub day: Weekday,
    pub session: Session,
    /// Period number within the day (1-based, continuous across sessions).
    pub period: u8,
}

impl Slot {
    /// Creates a slot.
    pub fn new(day: Weekday, session: Session, period: u8) -> Self {
        Self {
            day,
            session,
            period,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} P{}", self.day, self.period)
    }
}

/// Reserved activity occupying a fixed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FixedKind {
    /// Whole-school flag ceremony. No subject, no teacher.
    FlagCeremony,
    /// Class meeting led by the homeroom teacher.
    HomeroomActivity,
}

/// How a slot may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotKind {
    /// Assignable to a subject and teacher.
    Regular,
    /// Reserved; populated from the calendar, not by subject placement.
    Fixed(FixedKind),
    /// Not used.
    Unavailable,
}

/// Clock time range of a slot: [start, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    /// Length in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether two ranges overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Shape of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Number of periods in the session (0 = session not held).
    pub periods: u8,
    /// Start of the first period.
    pub start: NaiveTime,
    #[serde(default = "default_period_minutes")]
    pub period_minutes: u16,
    /// Gap between consecutive periods.
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u16,
}

fn default_period_minutes() -> u16 {
    45
}

fn default_break_minutes() -> u16 {
    5
}

impl SessionConfig {
    /// Session with default period and break lengths.
    pub fn new(periods: u8, start: NaiveTime) -> Self {
        Self {
            periods,
            start,
            period_minutes: default_period_minutes(),
            break_minutes: default_break_minutes(),
        }
    }

    fn start_minute(&self) -> u32 {
        self.start.num_seconds_from_midnight() / 60
    }

    fn end_minute(&self) -> u32 {
        if self.periods == 0 {
            return self.start_minute();
        }
        let n = u32::from(self.periods);
        self.start_minute()
            + n * u32::from(self.period_minutes)
            + (n - 1) * u32::from(self.break_minutes)
    }
}

/// (day, period) reference used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub day: Weekday,
    pub period: u8,
}

/// A reserved slot in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedSlotConfig {
    pub day: Weekday,
    pub period: u8,
    pub kind: FixedKind,
}

/// Calendar configuration.
///
/// Defaults to a six-day week with five morning periods, a Monday
/// first-period flag ceremony and a Saturday last-period homeroom activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub days: Vec<Weekday>,
    pub morning: SessionConfig,
    pub afternoon: SessionConfig,
    pub fixed: Vec<FixedSlotConfig>,
    pub unavailable: Vec<SlotKey>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            days: Weekday::ALL.to_vec(),
            morning: SessionConfig::new(5, clock(7, 0)),
            afternoon: SessionConfig::new(0, clock(13, 0)),
            fixed: vec![
                FixedSlotConfig {
                    day: Weekday::Mon,
                    period: 1,
                    kind: FixedKind::FlagCeremony,
                },
                FixedSlotConfig {
                    day: Weekday::Sat,
                    period: 5,
                    kind: FixedKind::HomeroomActivity,
                },
            ],
            unavailable: Vec::new(),
        }
    }
}

impl CalendarConfig {
    /// A grid with no reserved slots at all.
    pub fn plain(days: Vec<Weekday>, morning_periods: u8, afternoon_periods: u8) -> Self {
        Self {
            days,
            morning: SessionConfig::new(morning_periods, clock(7, 0)),
            afternoon: SessionConfig::new(afternoon_periods, clock(13, 0)),
            fixed: Vec::new(),
            unavailable: Vec::new(),
        }
    }

    /// Adds a fixed slot.
    pub fn with_fixed(mut self, day: Weekday, period: u8, kind: FixedKind) -> Self {
        self.fixed.push(FixedSlotConfig { day, period, kind });
        self
    }

    /// Marks a slot unavailable.
    pub fn with_unavailable(mut self, day: Weekday, period: u8) -> Self {
        self.unavailable.push(SlotKey { day, period });
        self
    }
}

fn clock(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

const MINUTES_PER_DAY: u32 = 24 * 60;

/// The validated weekly grid.
///
/// Pure and immutable once built. All lookups are deterministic.
#[derive(Debug, Clone)]
pub struct WeekCalendar {
    config: CalendarConfig,
    slots: Vec<Slot>,
    kinds: BTreeMap<Slot, SlotKind>,
    times: BTreeMap<Slot, TimeRange>,
}

impl WeekCalendar {
    /// Builds the grid, rejecting inconsistent configuration.
    pub fn new(config: CalendarConfig) -> Result<Self, CalendarError> {
        let invalid = |msg: String| Err(CalendarError::InvalidConfig(msg));

        if config.days.is_empty() {
            return invalid("at least one teaching day is required".into());
        }
        let unique_days: BTreeSet<Weekday> = config.days.iter().copied().collect();
        if unique_days.len() != config.days.len() {
            return invalid("teaching days must not repeat".into());
        }

        let morning = &config.morning;
        let afternoon = &config.afternoon;
        let total_periods = u16::from(morning.periods) + u16::from(afternoon.periods);
        if total_periods == 0 {
            return invalid("the day must have at least one period".into());
        }
        if total_periods > u16::from(u8::MAX) {
            return invalid(format!("{total_periods} periods per day is too many"));
        }
        for (name, session) in [("morning", morning), ("afternoon", afternoon)] {
            if session.periods > 0 && session.period_minutes == 0 {
                return invalid(format!("{name} period length must be positive"));
            }
            if session.end_minute() >= MINUTES_PER_DAY {
                return invalid(format!("{name} session runs past midnight"));
            }
        }
        if morning.periods > 0
            && afternoon.periods > 0
            && afternoon.start_minute() < morning.end_minute()
        {
            return invalid("afternoon session starts before the morning ends".into());
        }

        let mut slots = Vec::new();
        let mut times = BTreeMap::new();
        for &day in &unique_days {
            for (session_kind, session, first_period) in [
                (Session::Morning, morning, 1u8),
                (Session::Afternoon, afternoon, morning.periods.saturating_add(1)),
            ] {
                for i in 0..session.periods {
                    let slot = Slot::new(day, session_kind, first_period + i);
                    let offset = u32::from(i)
                        * (u32::from(session.period_minutes) + u32::from(session.break_minutes));
                    let start = session.start_minute() + offset;
                    let end = start + u32::from(session.period_minutes);
                    times.insert(slot, TimeRange {
                        start: minute_of_day(start)?,
                        end: minute_of_day(end)?,
                    });
                    slots.push(slot);
                }
            }
        }

        let mut kinds: BTreeMap<Slot, SlotKind> =
            slots.iter().map(|&s| (s, SlotKind::Regular)).collect();
        let find = |day: Weekday, period: u8| -> Option<Slot> {
            slots
                .iter()
                .copied()
                .find(|s| s.day == day && s.period == period)
        };

        for fixed in &config.fixed {
            let Some(slot) = find(fixed.day, fixed.period) else {
                return invalid(format!(
                    "fixed slot {} P{} is outside the grid",
                    fixed.day, fixed.period
                ));
            };
            if kinds.insert(slot, SlotKind::Fixed(fixed.kind)) != Some(SlotKind::Regular) {
                return invalid(format!("slot {slot} is reserved twice"));
            }
        }
        for key in &config.unavailable {
            let Some(slot) = find(key.day, key.period) else {
                return invalid(format!(
                    "unavailable slot {} P{} is outside the grid",
                    key.day, key.period
                ));
            };
            if kinds.insert(slot, SlotKind::Unavailable) != Some(SlotKind::Regular) {
                return invalid(format!("slot {slot} is reserved twice"));
            }
        }

        Ok(Self {
            config,
            slots,
            kinds,
            times,
        })
    }

    /// The configuration this grid was built from.
    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    /// Every slot of the week in scan order (day, then period).
    pub fn slots_for_grid(&self) -> &[Slot] {
        &self.slots
    }

    /// Kind of a slot. Slots outside the grid are `Unavailable`.
    pub fn kind_of(&self, slot: &Slot) -> SlotKind {
        self.kinds
            .get(slot)
            .copied()
            .unwrap_or(SlotKind::Unavailable)
    }

    /// Clock time of a slot, `None` if it is outside the grid.
    pub fn time_range_of(&self, slot: &Slot) -> Option<TimeRange> {
        self.times.get(slot).copied()
    }

    /// Looks up the slot at (day, period).
    pub fn slot_at(&self, day: Weekday, period: u8) -> Option<Slot> {
        self.slots
            .iter()
            .copied()
            .find(|s| s.day == day && s.period == period)
    }

    /// Regular slots in scan order.
    pub fn regular_slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.slots
            .iter()
            .copied()
            .filter(|s| self.kind_of(s) == SlotKind::Regular)
    }

    /// Number of regular slots in the week.
    pub fn regular_slot_count(&self) -> u32 {
        self.regular_slots().count() as u32
    }

    /// Fixed slots with their reserved activity, in scan order.
    pub fn fixed_slots(&self) -> impl Iterator<Item = (Slot, FixedKind)> + '_ {
        self.slots.iter().filter_map(|s| match self.kind_of(s) {
            SlotKind::Fixed(kind) => Some((*s, kind)),
            _ => None,
        })
    }

    /// Slots reserved for a given activity.
    pub fn slots_of_kind(&self, kind: FixedKind) -> Vec<Slot> {
        self.fixed_slots()
            .filter(|(_, k)| *k == kind)
            .map(|(s, _)| s)
            .collect()
    }
}

fn minute_of_day(minute: u32) -> Result<NaiveTime, CalendarError> {
    NaiveTime::from_num_seconds_from_midnight_opt(minute * 60, 0).ok_or_else(|| {
        CalendarError::InvalidConfig(format!("minute {minute} is not a valid time of day"))
    })
}
