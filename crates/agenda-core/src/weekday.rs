//! Weekday set stored by the task API as a 7-bit
//! mask. Bit 6 is Sunday, bit 0 is Saturday; a day
//! is toggled by XOR-ing its bit into the mask.

use chrono::Weekday;
use serde::{
  Deserialize,
  Serialize
};

use crate::error::ProjectError;

/// Sunday-first order used by every decode.
pub const WEEK_ORDER: [Weekday; 7] = [
  Weekday::Sun,
  Weekday::Mon,
  Weekday::Tue,
  Weekday::Wed,
  Weekday::Thu,
  Weekday::Fri,
  Weekday::Sat
];

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct WeekdayMask(u8);

impl WeekdayMask {
  pub const SUNDAY: u8 = 0b100_0000;
  pub const MONDAY: u8 = 0b010_0000;
  pub const TUESDAY: u8 = 0b001_0000;
  pub const WEDNESDAY: u8 = 0b000_1000;
  pub const THURSDAY: u8 = 0b000_0100;
  pub const FRIDAY: u8 = 0b000_0010;
  pub const SATURDAY: u8 = 0b000_0001;
  pub const ALL: u8 = 0b111_1111;

  pub const EMPTY: Self = Self(0);

  /// Keeps the seven weekday bits and drops
  /// anything above them.
  #[must_use]
  pub const fn from_bits(
    bits: u16
  ) -> Self {
    Self((bits & Self::ALL as u16) as u8)
  }

  #[must_use]
  pub const fn bits(self) -> u8 {
    self.0
  }

  #[must_use]
  pub const fn is_empty(self) -> bool {
    self.0 == 0
  }

  #[must_use]
  pub const fn bit_for(
    day: Weekday
  ) -> u8 {
    match day {
      | Weekday::Sun => Self::SUNDAY,
      | Weekday::Mon => Self::MONDAY,
      | Weekday::Tue => Self::TUESDAY,
      | Weekday::Wed => Self::WEDNESDAY,
      | Weekday::Thu => Self::THURSDAY,
      | Weekday::Fri => Self::FRIDAY,
      | Weekday::Sat => Self::SATURDAY
    }
  }

  /// Maps a raw value back to its weekday when it
  /// is exactly one of the seven canonical bits.
  #[must_use]
  pub fn day_for_bit(
    bit: u16
  ) -> Option<Weekday> {
    WEEK_ORDER.into_iter().find(|day| {
      u16::from(Self::bit_for(*day)) == bit
    })
  }

  #[must_use]
  pub fn contains(
    self,
    day: Weekday
  ) -> bool {
    self.0 & Self::bit_for(day) != 0
  }

  #[must_use]
  pub fn toggle_day(
    self,
    day: Weekday
  ) -> Self {
    Self(self.0 ^ Self::bit_for(day))
  }

  pub fn toggle_bit(
    self,
    bit: u16
  ) -> Result<Self, ProjectError> {
    let day = Self::day_for_bit(bit)
      .ok_or(
        ProjectError::InvalidWeekdayBit {
          bit
        }
      )?;
    Ok(self.toggle_day(day))
  }

  /// Exactly the selected days, Sunday first.
  #[must_use]
  pub fn selected(self) -> Vec<Weekday> {
    WEEK_ORDER
      .into_iter()
      .filter(|day| self.contains(*day))
      .collect()
  }

  /// Days an occurrence falls on. An empty mask
  /// means every day of the week.
  #[must_use]
  pub fn days(self) -> Vec<Weekday> {
    if self.is_empty() {
      return WEEK_ORDER.to_vec();
    }
    self.selected()
  }
}

impl FromIterator<Weekday>
  for WeekdayMask
{
  fn from_iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = Weekday>
  {
    Self(iter.into_iter().fold(
      0,
      |acc, day| acc | Self::bit_for(day)
    ))
  }
}

#[tracing::instrument(level = "trace")]
pub fn decode_weekday_bitmask(
  mask: u16
) -> Vec<Weekday> {
  WeekdayMask::from_bits(mask).days()
}

/// XOR-toggles one canonical weekday bit in a raw
/// stored mask. Bits outside the weekday range are
/// carried through untouched.
#[tracing::instrument(level = "trace")]
pub fn encode_weekday_toggle(
  mask: u16,
  bit: u16
) -> Result<u16, ProjectError> {
  if WeekdayMask::day_for_bit(bit)
    .is_none()
  {
    tracing::debug!(
      mask,
      bit,
      "rejected non-canonical weekday bit"
    );
    return Err(
      ProjectError::InvalidWeekdayBit {
        bit
      }
    );
  }
  Ok(mask ^ bit)
}

#[must_use]
pub fn weekday_key(
  day: Weekday
) -> &'static str {
  match day {
    | Weekday::Mon => "mon",
    | Weekday::Tue => "tue",
    | Weekday::Wed => "wed",
    | Weekday::Thu => "thu",
    | Weekday::Fri => "fri",
    | Weekday::Sat => "sat",
    | Weekday::Sun => "sun"
  }
}

#[must_use]
pub fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "monday" | "mon" | "mo" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues"
    | "tu" => Some(Weekday::Tue),
    | "wednesday" | "wed" | "we" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" | "th" => {
      Some(Weekday::Thu)
    }
    | "friday" | "fri" | "fr" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" | "sa" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" | "su" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

/// Serde adapter writing weekday lists as the
/// lowercase three-letter keys (`sun`, `mon`, ...).
pub mod weekday_keys {
  use chrono::Weekday;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  use super::{
    parse_weekday_name,
    weekday_key
  };

  pub fn serialize<S>(
    days: &Option<Vec<Weekday>>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match days {
      | Some(days) => serializer
        .collect_seq(
          days
            .iter()
            .map(|day| weekday_key(*day))
        ),
      | None => serializer.serialize_none()
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<Option<Vec<Weekday>>, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw =
      Option::<Vec<String>>::deserialize(
        deserializer
      )?;
    raw
      .map(|keys| {
        keys
          .iter()
          .map(|key| {
            parse_weekday_name(key)
              .ok_or_else(|| {
                serde::de::Error::custom(
                  format!(
                    "unknown weekday key: \
                     {key}"
                  )
                )
              })
          })
          .collect::<Result<Vec<_>, D::Error>>()
      })
      .transpose()
  }
}

#[cfg(test)]
mod tests {
  use chrono::Weekday;

  use super::*;

  #[test]
  fn zero_mask_means_every_day() {
    assert_eq!(
      decode_weekday_bitmask(0),
      WEEK_ORDER.to_vec()
    );
  }

  #[test]
  fn decodes_sunday_first_regardless_of_bit_order()
  {
    let mask = u16::from(
      WeekdayMask::SATURDAY
        | WeekdayMask::SUNDAY
        | WeekdayMask::WEDNESDAY
    );
    assert_eq!(
      decode_weekday_bitmask(mask),
      vec![
        Weekday::Sun,
        Weekday::Wed,
        Weekday::Sat
      ]
    );
  }

  #[test]
  fn every_nonzero_mask_decodes_to_its_set_bits()
  {
    for mask in 1..=u16::from(WeekdayMask::ALL)
    {
      let days =
        decode_weekday_bitmask(mask);
      for day in WEEK_ORDER {
        let bit = u16::from(
          WeekdayMask::bit_for(day)
        );
        assert_eq!(
          days.contains(&day),
          mask & bit != 0,
          "mask {mask:#09b} day {day}"
        );
      }
    }
  }

  #[test]
  fn high_bits_are_ignored() {
    assert_eq!(
      decode_weekday_bitmask(0b1_0000000),
      WEEK_ORDER.to_vec()
    );
    assert_eq!(
      decode_weekday_bitmask(
        0b1_0100000
      ),
      vec![Weekday::Mon]
    );
  }

  #[test]
  fn toggle_is_an_involution() {
    for mask in 0..=u16::from(WeekdayMask::ALL)
    {
      for day in WEEK_ORDER {
        let bit = u16::from(
          WeekdayMask::bit_for(day)
        );
        let once =
          encode_weekday_toggle(mask, bit)
            .expect("canonical bit");
        let twice =
          encode_weekday_toggle(once, bit)
            .expect("canonical bit");
        assert_ne!(once, mask);
        assert_eq!(twice, mask);
      }
    }
  }

  #[test]
  fn toggle_rejects_non_canonical_bits() {
    for bit in [0_u16, 3, 0b1000_0000, 96]
    {
      assert_eq!(
        encode_weekday_toggle(5, bit),
        Err(
          ProjectError::InvalidWeekdayBit {
            bit
          }
        )
      );
    }
  }

  #[test]
  fn typed_toggle_matches_raw_toggle() {
    let mask = WeekdayMask::EMPTY
      .toggle_day(Weekday::Mon)
      .toggle_day(Weekday::Wed);
    assert_eq!(
      u16::from(mask.bits()),
      encode_weekday_toggle(
        u16::from(WeekdayMask::MONDAY),
        u16::from(WeekdayMask::WEDNESDAY)
      )
      .expect("canonical bit")
    );
    assert_eq!(
      mask.selected(),
      vec![Weekday::Mon, Weekday::Wed]
    );
  }

  #[test]
  fn collects_days_into_mask() {
    let mask: WeekdayMask =
      [Weekday::Fri, Weekday::Sun]
        .into_iter()
        .collect();
    assert_eq!(
      mask.bits(),
      WeekdayMask::FRIDAY
        | WeekdayMask::SUNDAY
    );
  }

  #[test]
  fn parses_names_and_rrule_codes() {
    assert_eq!(
      parse_weekday_name("Thursday"),
      Some(Weekday::Thu)
    );
    assert_eq!(
      parse_weekday_name("TU"),
      Some(Weekday::Tue)
    );
    assert_eq!(
      parse_weekday_name("someday"),
      None
    );
  }
}
