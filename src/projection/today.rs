//! Today's agenda

use chrono::{DateTime, TimeZone};

use crate::projection::Dated;

/// The records scheduled today, split around the current time
#[derive(Debug)]
pub struct TodaySplit<'a, R> {
    /// Scheduled strictly after now, soonest first
    pub upcoming: Vec<&'a R>,
    /// Scheduled at or before now, most recent first
    pub past: Vec<&'a R>,
}

impl<'a, R> TodaySplit<'a, R> {
    pub fn len(&self) -> usize {
        self.upcoming.len() + self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split the records scheduled on the calendar day of `now` (as seen from its time zone).
///
/// Records without a usable date are left out.
pub fn today_split<'a, R, I, Tz>(items: I, now: &DateTime<Tz>) -> TodaySplit<'a, R>
where
    R: Dated + 'a,
    I: IntoIterator<Item = &'a R>,
    Tz: TimeZone,
{
    let tz = now.timezone();
    let today = now.naive_local().date();

    let mut upcoming = Vec::new();
    let mut past = Vec::new();
    for item in items {
        let at = match item.scheduled_at().and_then(|at| at.in_timezone(&tz)) {
            None => continue,
            Some(at) => at,
        };
        if at.naive_local().date() != today {
            continue;
        }
        if &at > now {
            upcoming.push((at, item));
        } else {
            past.push((at, item));
        }
    }

    upcoming.sort_by(|(a, _), (b, _)| a.cmp(b));
    past.sort_by(|(a, _), (b, _)| b.cmp(a));

    TodaySplit {
        upcoming: upcoming.into_iter().map(|(_, item)| item).collect(),
        past: past.into_iter().map(|(_, item)| item).collect(),
    }
}
