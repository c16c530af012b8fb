mod guide;
mod locator;
mod models;
mod synthesizer;

pub use guide::ProgramGuide;
pub use locator::{
    current_program, format_program_time, next_program, next_program_or_wrap, programs_for_day,
    time_until,
};
pub use models::{ProgramKind, ScheduleSlot};
pub use synthesizer::{gap_minutes, synthesize_week, MINUTES_PER_DAY, SCHEDULE_DAYS};
