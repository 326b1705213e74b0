//! Cell encoding.
//!
//! Each cell is 1 byte with three fields packed:
//! ┌─────────┬────────┬──────────┐
//! │ bits 7-5│ bit 4  │ bits 3-0 │
//! │  coins  │ alive  │  owner   │
//! │  (0-7)  │ (0/1)  │  (0-9)   │
//! └─────────┴────────┴──────────┘
//!
//! Owner and coins survive death: a dead cell with a nonzero owner is territory.

use crate::types::MAX_COINS;

pub const OWNER_MASK: u8 = 0x0F; // bits 0-3
pub const ALIVE_BIT: u8 = 0x10; // bit 4
pub const COINS_SHIFT: u8 = 5; // bits 5-7

#[inline(always)]
pub fn owner_of(cell: u8) -> u8 {
    cell & OWNER_MASK
}

#[inline(always)]
pub fn is_alive(cell: u8) -> bool {
    cell & ALIVE_BIT != 0
}

#[inline(always)]
pub fn coins_of(cell: u8) -> u8 {
    cell >> COINS_SHIFT
}

/// Owner is masked to 4 bits, coins saturate at 7.
#[inline(always)]
pub fn pack(owner: u8, alive: bool, coins: u8) -> u8 {
    (coins.min(MAX_COINS) << COINS_SHIFT)
        | (if alive { ALIVE_BIT } else { 0 })
        | (owner & OWNER_MASK)
}

#[inline(always)]
pub fn with_alive(cell: u8, alive: bool) -> u8 {
    if alive {
        cell | ALIVE_BIT
    } else {
        cell & !ALIVE_BIT
    }
}

#[inline(always)]
pub fn with_coins(cell: u8, coins: u8) -> u8 {
    (cell & (ALIVE_BIT | OWNER_MASK)) | (coins.min(MAX_COINS) << COINS_SHIFT)
}

#[inline(always)]
pub fn with_owner(cell: u8, owner: u8) -> u8 {
    (cell & !OWNER_MASK) | (owner & OWNER_MASK)
}

#[inline(always)]
pub fn add_coins(cell: u8, amount: u8) -> u8 {
    with_coins(cell, coins_of(cell).saturating_add(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_roundtrips_every_field() {
        for owner in 0..=9 {
            for coins in 0..=7 {
                for alive in [false, true] {
                    let cell = pack(owner, alive, coins);
                    assert_eq!(owner_of(cell), owner, "owner mismatch");
                    assert_eq!(is_alive(cell), alive, "alive mismatch");
                    assert_eq!(coins_of(cell), coins, "coins mismatch");
                }
            }
        }
    }

    #[test]
    fn test_pack_specific_values() {
        assert_eq!(pack(0, false, 0), 0); // Dead, unclaimed, 0 coins
        assert_eq!(pack(1, false, 0), 1); // Dead, Player 1 territory
        assert_eq!(pack(1, true, 0), 17); // Alive, Player 1
        assert_eq!(pack(1, true, 1), 49); // Alive, Player 1, 1 coin
        assert_eq!(pack(5, true, 3), 117);
        assert_eq!(pack(2, false, 7), 226);
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        // Coins saturate rather than wrap
        assert_eq!(coins_of(pack(1, true, 10)), 7);
        assert_eq!(coins_of(pack(1, true, 255)), 7);
        // Owner is masked to 4 bits
        assert_eq!(owner_of(pack(0x13, false, 0)), 3);
    }

    #[test]
    fn test_add_coins_never_exceeds_cap() {
        for start in 0..=7 {
            for amount in [0u8, 1, 2, 6, 7, 8, 100, 255] {
                let cell = add_coins(pack(4, true, start), amount);
                assert!(coins_of(cell) <= 7);
                assert_eq!(coins_of(cell), start.saturating_add(amount).min(7));
                assert_eq!(owner_of(cell), 4);
                assert!(is_alive(cell));
            }
        }
    }

    #[test]
    fn test_with_alive_preserves_territory() {
        let cell = pack(3, false, 2);
        let revived = with_alive(cell, true);
        assert!(is_alive(revived));
        assert_eq!(owner_of(revived), 3);
        assert_eq!(coins_of(revived), 2);

        let killed = with_alive(revived, false);
        assert_eq!(killed, cell);
    }

    #[test]
    fn test_with_coins_and_owner_touch_one_field() {
        let cell = pack(6, true, 5);
        let cleared = with_coins(cell, 0);
        assert_eq!(cleared, pack(6, true, 0));

        let claimed = with_owner(cell, 2);
        assert_eq!(claimed, pack(2, true, 5));
    }
}
