//! Page rotation.
//!
//! The board cycles through the configured stops. Each stop visit shows its
//! name page (unless the previous visit showed the same name) followed by its
//! schedule page. Timing is checked on every tick; a page switch happens when
//! the current page has been up for at least its duration.

use std::time::Duration;

use departure_core::{MonotonicInstant, StopRegistry};

/// How long a stop-name page stays up.
pub const NAME_PAGE_DURATION: Duration = Duration::from_millis(5000);

/// How long a schedule page stays up.
pub const SCHEDULE_PAGE_DURATION: Duration = Duration::from_millis(8000);

/// Page selected for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Stop name with the departures/arrivals subtitle
    StopName {
        /// Index into the stop registry
        stop_index: usize,
    },
    /// Upcoming trips for the stop
    Schedule {
        /// Index into the stop registry
        stop_index: usize,
    },
}

impl Page {
    /// Stop this page belongs to.
    pub fn stop_index(self) -> usize {
        match self {
            Self::StopName { stop_index } | Self::Schedule { stop_index } => stop_index,
        }
    }

    /// How long this page stays up.
    pub fn duration(self) -> Duration {
        match self {
            Self::StopName { .. } => NAME_PAGE_DURATION,
            Self::Schedule { .. } => SCHEDULE_PAGE_DURATION,
        }
    }
}

/// Result of one pagination tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTick {
    /// Registry is empty; nothing rotates
    NoStops,
    /// Current page stays up
    Hold(Page),
    /// A new page was selected on this tick
    Switched(Page),
}

/// Timed page rotation state.
#[derive(Debug, Clone)]
pub struct PaginationEngine<I: MonotonicInstant> {
    current_stop_index: usize,
    current_subpage_index: usize,
    total_subpages: usize,
    last_displayed_stop_name: String,
    last_page_switch: Option<I>,
    current_page_duration: Duration,
}

impl<I: MonotonicInstant> Default for PaginationEngine<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MonotonicInstant> PaginationEngine<I> {
    /// Create an engine that enters the first stop on its first tick.
    pub fn new() -> Self {
        Self {
            current_stop_index: 0,
            current_subpage_index: 0,
            total_subpages: 1,
            last_displayed_stop_name: String::new(),
            last_page_switch: None,
            current_page_duration: Duration::ZERO,
        }
    }

    /// Advance the rotation if the current page has been up long enough.
    pub fn tick(&mut self, now: I, stops: &StopRegistry) -> PageTick {
        if stops.is_empty() {
            return PageTick::NoStops;
        }

        match self.last_page_switch {
            None => self.enter_stop(0, stops),
            Some(last) if now - last >= self.current_page_duration => {
                self.current_subpage_index += 1;
                if self.current_subpage_index >= self.total_subpages {
                    let next = (self.current_stop_index + 1) % stops.len();
                    self.enter_stop(next, stops);
                }
            },
            Some(_) => return PageTick::Hold(self.current_page()),
        }

        let page = self.current_page();
        self.current_page_duration = page.duration();
        self.last_page_switch = Some(now);
        PageTick::Switched(page)
    }

    /// Page selected by the current state.
    pub fn current_page(&self) -> Page {
        let stop_index = self.current_stop_index;
        if self.total_subpages == 2 && self.current_subpage_index == 0 {
            Page::StopName { stop_index }
        } else {
            Page::Schedule { stop_index }
        }
    }

    /// Whether the first page has been entered.
    pub fn has_started(&self) -> bool {
        self.last_page_switch.is_some()
    }

    /// How long the current page stays up.
    pub fn current_page_duration(&self) -> Duration {
        self.current_page_duration
    }

    fn enter_stop(&mut self, index: usize, stops: &StopRegistry) {
        let name = stops.get(index).map(|stop| stop.name.as_str()).unwrap_or_default();
        if name == self.last_displayed_stop_name {
            self.total_subpages = 1;
        } else {
            self.total_subpages = 2;
            name.clone_into(&mut self.last_displayed_stop_name);
        }
        self.current_stop_index = index;
        self.current_subpage_index = 0;
    }
}
