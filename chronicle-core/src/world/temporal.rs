//! The world clock: time of day, calendar, season and weather.
//!
//! A month is 30 days and a year 12 months. The clock advances in
//! time-of-day slots; crossing midnight rolls the day, month and year and
//! re-rolls the weather from the season's table.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Days in every month.
pub const DAYS_PER_MONTH: u32 = 30;
/// Months in every year.
pub const MONTHS_PER_YEAR: u32 = 12;

/// One of six slots in a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    /// First light.
    #[default]
    Dawn,
    /// Morning.
    Morning,
    /// Middle of the day.
    Midday,
    /// Afternoon.
    Afternoon,
    /// Evening.
    Evening,
    /// Night.
    Night,
}

impl TimeOfDay {
    /// The next slot, and whether the day rolled over.
    #[must_use]
    pub fn next(self) -> (Self, bool) {
        match self {
            Self::Dawn => (Self::Morning, false),
            Self::Morning => (Self::Midday, false),
            Self::Midday => (Self::Afternoon, false),
            Self::Afternoon => (Self::Evening, false),
            Self::Evening => (Self::Night, false),
            Self::Night => (Self::Dawn, true),
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dawn => "dawn",
            Self::Morning => "morning",
            Self::Midday => "midday",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        })
    }
}

/// Season, derived from the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// Months 3–5.
    Spring,
    /// Months 6–8.
    Summer,
    /// Months 9–11.
    Autumn,
    /// Months 12, 1 and 2.
    Winter,
}

impl Season {
    /// Season for a 1-based month.
    #[must_use]
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            9..=11 => Self::Autumn,
            _ => Self::Winter,
        }
    }

    /// Weather that can occur in this season. Repeats weight the roll.
    #[must_use]
    pub fn weather_table(self) -> &'static [Weather] {
        use Weather::{Clear, Cloudy, Fog, Heatwave, Rain, Snow, Storm, Wind};
        match self {
            Self::Spring => &[Clear, Clear, Cloudy, Rain, Rain, Wind, Fog],
            Self::Summer => &[Clear, Clear, Clear, Cloudy, Heatwave, Storm, Rain],
            Self::Autumn => &[Cloudy, Cloudy, Rain, Rain, Fog, Wind, Clear, Storm],
            Self::Winter => &[Snow, Snow, Cloudy, Clear, Fog, Wind, Storm],
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Autumn => "autumn",
            Self::Winter => "winter",
        })
    }
}

/// Today's weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    /// Clear skies.
    #[default]
    Clear,
    /// Overcast.
    Cloudy,
    /// Rain.
    Rain,
    /// Thunderstorm.
    Storm,
    /// Fog.
    Fog,
    /// Snow.
    Snow,
    /// Oppressive heat.
    Heatwave,
    /// Strong wind.
    Wind,
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Clear => "clear",
            Self::Cloudy => "cloudy",
            Self::Rain => "rain",
            Self::Storm => "storm",
            Self::Fog => "fog",
            Self::Snow => "snow",
            Self::Heatwave => "heatwave",
            Self::Wind => "wind",
        })
    }
}

/// Calendar position of the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldClock {
    /// Day of the month, 1..=30.
    pub day: u32,
    /// Month, 1..=12.
    pub month: u32,
    /// Year, starting at 1.
    pub year: u32,
    /// Current slot.
    pub time_of_day: TimeOfDay,
    /// Season for `month`.
    pub season: Season,
    /// Weather for today.
    pub weather: Weather,
    /// Days since the world began, starting at 1.
    pub absolute_day: u32,
}

impl Default for WorldClock {
    fn default() -> Self {
        Self {
            day: 1,
            month: 3,
            year: 1,
            time_of_day: TimeOfDay::Dawn,
            season: Season::Spring,
            weather: Weather::Clear,
            absolute_day: 1,
        }
    }
}

impl WorldClock {
    /// Advance by `steps` time-of-day slots. Returns the number of days
    /// that rolled over.
    pub fn advance<R: Rng + ?Sized>(&mut self, steps: u32, rng: &mut R) -> u32 {
        let mut days = 0;
        for _ in 0..steps {
            let (next, rolled) = self.time_of_day.next();
            self.time_of_day = next;
            if rolled {
                self.next_day(rng);
                days += 1;
            }
        }
        days
    }

    fn next_day<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.absolute_day += 1;
        self.day += 1;
        if self.day > DAYS_PER_MONTH {
            self.day = 1;
            self.month += 1;
            if self.month > MONTHS_PER_YEAR {
                self.month = 1;
                self.year += 1;
            }
        }
        self.season = Season::from_month(self.month);
        self.weather = self
            .season
            .weather_table()
            .choose(rng)
            .copied()
            .unwrap_or_default();
    }
}

impl fmt::Display for WorldClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of day {}, month {}, year {} ({}, {})",
            self.time_of_day, self.day, self.month, self.year, self.season, self.weather
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn six_steps_make_a_day() {
        let mut clock = WorldClock::default();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(clock.advance(5, &mut rng), 0);
        assert_eq!(clock.time_of_day, TimeOfDay::Night);
        assert_eq!(clock.advance(1, &mut rng), 1);
        assert_eq!(clock.time_of_day, TimeOfDay::Dawn);
        assert_eq!(clock.day, 2);
        assert_eq!(clock.absolute_day, 2);
    }

    #[test]
    fn month_and_year_roll_over() {
        let mut clock = WorldClock {
            day: 30,
            month: 12,
            year: 4,
            time_of_day: TimeOfDay::Night,
            season: Season::Winter,
            weather: Weather::Snow,
            absolute_day: 100,
        };
        let mut rng = StdRng::seed_from_u64(1);
        clock.advance(1, &mut rng);
        assert_eq!((clock.day, clock.month, clock.year), (1, 1, 5));
        assert_eq!(clock.season, Season::Winter);
        assert!(Season::Winter.weather_table().contains(&clock.weather));
    }

    #[test]
    fn season_changes_with_month() {
        let mut clock = WorldClock {
            day: 30,
            month: 5,
            time_of_day: TimeOfDay::Night,
            ..WorldClock::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        clock.advance(1, &mut rng);
        assert_eq!(clock.month, 6);
        assert_eq!(clock.season, Season::Summer);
    }

    #[test]
    fn seasons_by_month() {
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(4), Season::Spring);
        assert_eq!(Season::from_month(8), Season::Summer);
        assert_eq!(Season::from_month(11), Season::Autumn);
        assert_eq!(Season::from_month(12), Season::Winter);
    }
}
