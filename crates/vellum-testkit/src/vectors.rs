//! Decision-table vectors.
//!
//! One vector per (prior, desired) pair. Applying `desired` to an identity
//! that currently holds `prior` must leave exactly the stated local entry and
//! overlay mark behind, and the identity's effective permission must then be
//! `desired`.

use vellum_core::{AccessLevel, EffectivePermission};

/// A single permission transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionCase {
    /// What the transition does, in repository terms.
    pub action: &'static str,
    /// The permission held before the change.
    pub prior: EffectivePermission,
    /// The permission asked for.
    pub desired: EffectivePermission,
    /// The identity's local ACL level afterwards.
    pub expected_level: Option<AccessLevel>,
    /// Whether the overlay marks the identity "take" afterwards.
    pub expected_take: bool,
}

impl DecisionCase {
    /// Whether the transition leaves the permission unchanged.
    pub fn is_unchanged(&self) -> bool {
        self.prior == self.desired
    }
}

/// All 16 transitions.
pub fn decision_table() -> Vec<DecisionCase> {
    use AccessLevel::{Read, ReadWrite};
    use EffectivePermission::{Edit, None, Take, View};

    vec![
        case(None, None, "nothing", Option::None, false),
        case(None, Take, "add overlay", Some(Read), true),
        case(None, View, "add Read", Some(Read), false),
        case(None, Edit, "add ReadWrite", Some(ReadWrite), false),
        case(Take, None, "remove overlay", Option::None, false),
        case(Take, Take, "nothing", Some(Read), true),
        case(Take, View, "remove overlay, keep Read", Some(Read), false),
        case(Take, Edit, "remove overlay, Read to ReadWrite", Some(ReadWrite), false),
        case(View, None, "remove Read", Option::None, false),
        case(View, Take, "add overlay, keep Read", Some(Read), true),
        case(View, View, "nothing", Some(Read), false),
        case(View, Edit, "Read to ReadWrite", Some(ReadWrite), false),
        case(Edit, None, "remove ReadWrite", Option::None, false),
        case(Edit, Take, "add overlay, ReadWrite to Read", Some(Read), true),
        case(Edit, View, "ReadWrite to Read", Some(Read), false),
        case(Edit, Edit, "nothing", Some(ReadWrite), false),
    ]
}

const fn case(
    prior: EffectivePermission,
    desired: EffectivePermission,
    action: &'static str,
    expected_level: Option<AccessLevel>,
    expected_take: bool,
) -> DecisionCase {
    DecisionCase {
        action,
        prior,
        desired,
        expected_level,
        expected_take,
    }
}
