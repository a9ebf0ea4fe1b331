use heapless::String;
use serde::{Deserialize, Serialize};

use crate::consts::{MAX_MAPPABLE_RX_INPUTS, RC_CHANNEL_LETTERS};

/// Logical to physical channel map. Entry `n` holds the physical input which
/// feeds the role at position `n` of [`RC_CHANNEL_LETTERS`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RcMap(pub [u8; MAX_MAPPABLE_RX_INPUTS]);

impl Default for RcMap {
    fn default() -> Self {
        RcMap::identity()
    }
}

impl RcMap {
    pub const fn identity() -> Self {
        let mut map = [0; MAX_MAPPABLE_RX_INPUTS];
        let mut i = 0;
        while i < MAX_MAPPABLE_RX_INPUTS {
            map[i] = i as u8;
            i += 1;
        }
        RcMap(map)
    }

    /// Build a map from a letter string such as `"TAER1234"`. The position of
    /// each letter in `input` becomes the physical input of that role. Letters
    /// outside of the mappable roles, and any other characters, are ignored.
    pub fn parse(input: &str) -> Self {
        let mut map = RcMap::identity();
        let letters = RC_CHANNEL_LETTERS.as_bytes();

        for (position, byte) in input.bytes().enumerate() {
            let Some(role) = letters.iter().position(|&l| l == byte) else {
                continue;
            };

            if role >= MAX_MAPPABLE_RX_INPUTS {
                continue;
            }

            if let Ok(position) = u8::try_from(position) {
                map.0[role] = position;
            }
        }

        map
    }

    /// Physical input feeding the logical `channel`. Channels beyond the map
    /// are passed through unchanged.
    pub fn remap(&self, channel: usize) -> usize {
        match self.0.get(channel) {
            Some(&physical) => physical as usize,
            None => channel,
        }
    }

    /// Render the map back into its letter form, the inverse of [`RcMap::parse`].
    pub fn to_letters(&self) -> String<MAX_MAPPABLE_RX_INPUTS> {
        let letters = &RC_CHANNEL_LETTERS.as_bytes()[..MAX_MAPPABLE_RX_INPUTS];

        let mut buf = [0u8; MAX_MAPPABLE_RX_INPUTS];
        buf.copy_from_slice(letters);
        for (role, &physical) in self.0.iter().enumerate() {
            if let Some(slot) = buf.get_mut(physical as usize) {
                *slot = letters[role];
            }
        }

        let mut out = String::new();
        for byte in buf {
            _ = out.push(byte as char);
        }
        out
    }
}
