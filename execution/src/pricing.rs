//! Click price curve: linear decay toward the floor between clicks and a
//! fixed step up after each one.

use clickfarm_types::factory::Auction;

/// Price a click must pay at `now`.
pub fn decayed_price(auction: &Auction, now: u64) -> u128 {
    let elapsed = now.saturating_sub(auction.last_action) as u128;
    let decay = auction.decay_per_second.saturating_mul(elapsed);
    auction.clamp(auction.price.saturating_sub(decay))
}

/// Price recorded after a click paid `paid`.
pub fn next_price(auction: &Auction, paid: u128) -> u128 {
    auction.clamp(paid.saturating_add(auction.increase_step))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clickfarm_types::factory::WAD;
    use proptest::prelude::*;

    fn auction() -> Auction {
        Auction {
            price: 10 * WAD,
            last_action: 1_000,
            floor_price: 2 * WAD,
            increase_step: WAD,
            decay_per_second: WAD / 10,
            max_price: 0,
            ..Auction::new(1_000)
        }
    }

    #[test]
    fn test_decay_is_linear_until_floor() {
        let auction = auction();
        assert_eq!(decayed_price(&auction, 1_000), 10 * WAD);
        assert_eq!(decayed_price(&auction, 1_010), 9 * WAD);
        assert_eq!(decayed_price(&auction, 1_080), 2 * WAD);
        assert_eq!(decayed_price(&auction, 1_000_000), 2 * WAD);
    }

    #[test]
    fn test_stale_clock_does_not_raise_price() {
        let auction = auction();
        assert_eq!(decayed_price(&auction, 0), 10 * WAD);
    }

    #[test]
    fn test_next_price_steps_and_caps() {
        let mut auction = auction();
        assert_eq!(next_price(&auction, 9 * WAD), 10 * WAD);
        auction.max_price = 12 * WAD;
        assert_eq!(next_price(&auction, 11 * WAD + WAD / 2), 12 * WAD);
    }

    proptest! {
        #[test]
        fn test_price_never_below_floor(
            price in 0u128..1_000_000_000_000_000_000_000,
            decay in 0u128..1_000_000_000_000_000_000,
            elapsed in 0u64..u32::MAX as u64,
        ) {
            let auction = Auction { price, decay_per_second: decay, ..auction() };
            prop_assert!(decayed_price(&auction, 1_000 + elapsed) >= auction.floor_price);
        }

        #[test]
        fn test_click_strictly_raises_price(paid in 2_000_000_000_000_000_000u128..1_000_000_000_000_000_000_000) {
            let auction = auction();
            prop_assert!(next_price(&auction, paid) > paid);
        }
    }
}
