use super::*;
use commonware_codec::{DecodeExt, Encode, EncodeSize, ReadExt};
use commonware_cryptography::{ed25519::PrivateKey, PrivateKeyExt, Signer};
use rand::{rngs::StdRng, SeedableRng};

fn keys(count: usize) -> Vec<commonware_cryptography::ed25519::PublicKey> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| PrivateKey::from_rng(&mut rng).public_key())
        .collect()
}

#[test]
fn test_schedule_floor_lookup() {
    // Thresholds and levels from the reference deployment.
    let schedule = Schedule::new(
        vec![0, 10, 50, 500, 50_000, 5_000_000],
        vec![0, 1, 5, 25, 50, 100],
    )
    .unwrap();

    assert_eq!(schedule.floor(0, 0), 0);
    assert_eq!(schedule.floor(9, 0), 0);
    assert_eq!(schedule.floor(10, 0), 1);
    assert_eq!(schedule.floor(499, 0), 5);
    assert_eq!(schedule.floor(500, 0), 25);
    assert_eq!(schedule.floor(u128::MAX, 0), 100);

    // Inputs below the first threshold fall back to the base value.
    let offset = Schedule::new(vec![100, 200], vec![3, 4]).unwrap();
    assert_eq!(offset.floor(99, 7), 7);
    assert_eq!(offset.floor(150, 7), 3);
}

#[test]
fn test_schedule_validation() {
    assert_eq!(
        Schedule::new(vec![], vec![]),
        Err(Error::InvalidConfiguration("schedule must not be empty"))
    );
    assert!(Schedule::new(vec![0, 1], vec![1]).is_err());
    assert!(Schedule::new(vec![5, 1], vec![1, 2]).is_err());
    assert!(Schedule::new(vec![1, 5], vec![2, 1]).is_err());
    assert!(Schedule::new(vec![1, 1], vec![2, 2]).is_ok());
}

#[test]
fn test_schedule_tiers() {
    let schedule = Schedule::new(vec![0, 10 * WAD, 40 * WAD], vec![WAD, 2 * WAD, 3 * WAD]).unwrap();
    assert_eq!(schedule.max_tier(), 2);
    assert_eq!(schedule.threshold(1), Some(10 * WAD));
    assert_eq!(schedule.threshold(3), None);
    assert_eq!(schedule.multiplier(2), 3 * WAD);
    // A tier beyond a shrunken table keeps the last value.
    assert_eq!(schedule.multiplier(9), 3 * WAD);
    // An unconfigured table is neutral.
    assert_eq!(Schedule::default().multiplier(0), WAD);
    assert_eq!(Schedule::default().max_tier(), 0);
}

#[test]
fn test_set_tools_preserves_slot_settings() {
    let mut catalog = Catalog::default();
    catalog.set_tools(&[10, 20], &[1, 2]).unwrap();
    catalog.set_max_amounts(&[10, 30]).unwrap();

    // Growing the table keeps the old caps and defaults the new slot.
    catalog.set_tools(&[11, 21, 31], &[1, 2, 3]).unwrap();
    assert_eq!(catalog.tools[0].max_amount, 10);
    assert_eq!(catalog.tools[1].max_amount, 30);
    assert_eq!(catalog.tools[2].max_amount, DEFAULT_TOOL_MAX_AMOUNT);
    assert_eq!(catalog.tools[2].growth, DEFAULT_TOOL_GROWTH);

    // Shrinking invalidates the trailing slot.
    catalog.set_tools(&[11], &[1]).unwrap();
    assert_eq!(catalog.tool(1), Err(Error::ToolDoesNotExist(1)));
}

#[test]
fn test_catalog_rejects_malformed_tables() {
    let mut catalog = Catalog::default();
    assert!(catalog.set_tools(&[], &[]).is_err());
    assert!(catalog.set_tools(&[1, 2], &[1]).is_err());
    assert!(catalog.set_tools(&[0], &[1]).is_err());
    catalog.set_tools(&[1, 2], &[1, 2]).unwrap();

    assert!(catalog.set_max_amounts(&[5]).is_err());
    assert!(catalog.set_growths(&[WAD, 2 * WAD]).is_err());
    assert!(catalog.set_multipliers(vec![]).is_err());
    assert!(catalog.set_multipliers(vec![2 * WAD, WAD]).is_err());
    assert!(catalog.set_multipliers(vec![0, WAD]).is_err());

    // Rejected calls leave the catalog untouched.
    assert_eq!(catalog.tools[0].growth, DEFAULT_TOOL_GROWTH);
    assert!(catalog.multipliers.is_empty());
}

#[test]
fn test_catalog_roundtrip() {
    let mut catalog = Catalog::default();
    catalog.set_tools(&[WAD, 100 * WAD], &[WAD / 10, WAD]).unwrap();
    catalog.set_multipliers(vec![WAD, 2 * WAD]).unwrap();
    catalog.levels = Schedule::new(vec![0, 10], vec![0, 1]).unwrap();
    catalog.evolution_mode = EvolutionMode::Halve;
    catalog
        .set_slot_upgrades(1, Some(Schedule::new(vec![0, 5 * WAD], vec![WAD, 3 * WAD]).unwrap()))
        .unwrap();

    let encoded = catalog.encode();
    assert_eq!(encoded.len(), catalog.encode_size());
    let decoded = Catalog::decode(encoded).unwrap();
    assert_eq!(catalog, decoded);
    assert_eq!(decoded.upgrades_of(&decoded.tools[0]), &decoded.upgrades);
    assert_eq!(decoded.upgrades_of(&decoded.tools[1]).max_tier(), 1);
}

#[test]
fn test_schedule_decode_rejects_unordered() {
    let descending = Schedule {
        thresholds: vec![10, 0],
        values: vec![WAD, 2 * WAD],
    };
    assert!(Schedule::decode(descending.encode()).is_err());

    let shrinking = Schedule {
        thresholds: vec![0, 10],
        values: vec![2 * WAD, WAD],
    };
    assert!(Schedule::decode(shrinking.encode()).is_err());

    let mismatched = Schedule {
        thresholds: vec![0, 10],
        values: vec![WAD],
    };
    assert!(Schedule::decode(mismatched.encode()).is_err());

    // The unconfigured default still decodes.
    assert_eq!(Schedule::decode(Schedule::default().encode()).unwrap(), Schedule::default());
}

#[test]
fn test_factory_holdings_grow_lazily() {
    let mut factory = Factory::new(100);
    assert_eq!(factory.holding(3), ToolHolding::default());
    factory.holding_mut(3).amount = 4;
    factory.rate = 3 * WAD;
    assert_eq!(factory.tools.len(), 4);
    assert_eq!(factory.units(), 4);

    let encoded = factory.encode();
    let decoded = Factory::read(&mut &encoded[..]).unwrap();
    assert_eq!(factory, decoded);
}

#[test]
fn test_queue_cursor_rejects_inverted() {
    let mut buf = Vec::new();
    commonware_codec::Write::write(&5u64, &mut buf);
    commonware_codec::Write::write(&4u64, &mut buf);
    assert!(QueueCursor::read(&mut &buf[..]).is_err());
}

#[test]
fn test_distribution_split_is_exact() {
    let keys = keys(3);
    let distribution = Distribution {
        treasury: keys[0].clone(),
        developer: keys[1].clone(),
        rewards: keys[2].clone(),
        treasury_bps: 5_000,
        developer_bps: 3_333,
    };

    for total in [0u128, 1, 7, 10_001, 123_456_789 * WAD + 17, u128::MAX] {
        let split = distribution.split(total);
        assert_eq!(split.treasury + split.developer + split.rewards, total);
        assert_eq!(split.treasury, total / 2);
    }

    let split = distribution.split(10_000);
    assert_eq!(split.treasury, 5_000);
    assert_eq!(split.developer, 3_333);
    assert_eq!(split.rewards, 1_667);
}

#[test]
fn test_distribution_rejects_overallocation() {
    let keys = keys(3);
    let distribution = Distribution {
        treasury: keys[0].clone(),
        developer: keys[1].clone(),
        rewards: keys[2].clone(),
        treasury_bps: 9_000,
        developer_bps: 2_000,
    };
    assert!(Distribution::decode(distribution.encode()).is_err());
}

#[test]
fn test_error_codes_are_distinct() {
    let errors = [
        Error::NotAuthorized,
        Error::NotOwner(1),
        Error::PassNotFound(1),
        Error::InvalidConfiguration("x"),
        Error::ToolDoesNotExist(1),
        Error::InvalidQuantity,
        Error::ToolLocked {
            slot: 0,
            required: 1,
            current: 0,
        },
        Error::AmountMaxed { slot: 0, cap: 1 },
        Error::LevelMaxed(0),
        Error::PowerMaxed,
        Error::EvolutionMaxed,
        Error::EvolutionLocked {
            required: 1,
            earned: 0,
        },
        Error::InsufficientBalance {
            required: 1,
            available: 0,
        },
        Error::EpochIdMismatch {
            expected: 1,
            got: 0,
        },
        Error::DeadlineExpired {
            deadline: 0,
            now: 1,
        },
        Error::ExceedsMaxPayment {
            price: 2,
            max_payment: 1,
        },
        Error::InvalidPayment {
            price: 2,
            payment: 1,
        },
        Error::MessageTooLong {
            length: MAX_MESSAGE_LENGTH + 1,
            max: MAX_MESSAGE_LENGTH,
        },
        Error::EmptyPool,
        Error::NotConfigured,
        Error::Overflow,
    ];
    let mut codes: Vec<u8> = errors.iter().map(Error::code).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}
