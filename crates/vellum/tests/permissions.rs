//! Permission resolution and permission changes against the fixture
//! repository.

use proptest::prelude::*;
use tracing_subscriber::EnvFilter;

use vellum::core::{AccessLevel, Ace, MODIFIED_PROPERTY};
use vellum::repo::MemoryRepository;
use vellum::{ApplyReport, Client, ClientConfig, ClientError, EffectivePermission};
use vellum_testkit::fixtures::{ADMIN, ADMINISTRATORS, FOLDER, RIGHTS_DOCUMENT};
use vellum_testkit::generators::{effective_permission, unrelated_aces};
use vellum_testkit::{decision_table, TestFixture};

type TestClient = Client<MemoryRepository, MemoryRepository>;

/// Opt-in log output, e.g. `RUST_LOG=vellum=debug`. Repeat calls are no-ops.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn client(fixture: &TestFixture) -> anyhow::Result<TestClient> {
    Ok(Client::new(
        fixture.repo.clone(),
        fixture.repo.clone(),
        ClientConfig::default(),
    )?)
}

#[test]
fn decision_table_is_complete() -> anyhow::Result<()> {
    init_tracing();
    for case in decision_table() {
        let fixture = TestFixture::new();
        let client = client(&fixture)?;

        client.apply_permissions(&fixture.folder, &fixture.rights, [("alice", case.prior)])?;
        assert_eq!(
            client.effective_permission("alice", &fixture.rights)?,
            case.prior,
            "prior state for {:?} -> {:?}",
            case.prior,
            case.desired
        );

        client.apply_permissions(&fixture.folder, &fixture.rights, [("alice", case.desired)])?;

        let context = format!("{:?} -> {:?} ({})", case.prior, case.desired, case.action);
        assert_eq!(fixture.local_level("alice"), case.expected_level, "{context}");
        assert_eq!(fixture.overlay().grants_take("alice"), case.expected_take, "{context}");
        assert_eq!(
            client.effective_permission("alice", &fixture.rights)?,
            case.desired,
            "{context}"
        );
        assert_eq!(fixture.local_level(ADMIN), Some(AccessLevel::Everything), "{context}");
        assert_eq!(
            fixture.local_level(ADMINISTRATORS),
            Some(AccessLevel::Everything),
            "{context}"
        );
    }
    Ok(())
}

#[test]
fn take_then_edit_on_one_document() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::new();
    let client = client(&fixture)?;
    let document = &fixture.rights;

    let report = client.apply_permissions(document, document, [("alice", EffectivePermission::Take)])?;
    assert_eq!(
        report,
        ApplyReport {
            cleared_local: false,
            restored: 0,
            granted: 1,
            overlay_written: true,
        }
    );
    assert_eq!(
        fixture.repo.local_acl(RIGHTS_DOCUMENT)?,
        vec![Ace::grant("alice", AccessLevel::Read)]
    );
    let overlay = fixture.overlay();
    assert_eq!(overlay.len(), 1);
    assert_eq!(overlay.get("alice"), Some("take"));
    assert_eq!(client.effective_permission("alice", document)?, EffectivePermission::Take);

    let report = client.apply_permissions(document, document, [("alice", EffectivePermission::Edit)])?;
    assert!(report.cleared_local);
    assert!(report.overlay_written);
    assert_eq!(
        fixture.repo.local_acl(RIGHTS_DOCUMENT)?,
        vec![Ace::grant("alice", AccessLevel::ReadWrite)]
    );
    assert!(!fixture.overlay().contains("alice"));
    assert_eq!(client.effective_permission("alice", document)?, EffectivePermission::Edit);
    Ok(())
}

#[test]
fn several_identities_share_one_overlay_write() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let client = client(&fixture)?;
    let before = fixture.repo.stats().property_writes;

    client.apply_permissions(
        &fixture.folder,
        &fixture.rights,
        [
            ("alice", EffectivePermission::Take),
            ("Bob", EffectivePermission::Take),
            ("carol", EffectivePermission::View),
        ],
    )?;

    let overlay = fixture.overlay();
    assert!(overlay.grants_take("alice"));
    assert!(overlay.grants_take("bob"));
    assert!(!overlay.contains("carol"));

    // One overlay rewrite plus the modification stamp.
    assert_eq!(fixture.repo.stats().property_writes - before, 2);
    assert!(fixture.repo.property(FOLDER, MODIFIED_PROPERTY)?.is_some());
    Ok(())
}

#[test]
fn group_membership_counts() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let client = client(&fixture)?;

    client.apply_permissions(&fixture.folder, &fixture.rights, [("instructors", EffectivePermission::Edit)])?;

    assert_eq!(client.effective_permission("dave", &fixture.rights)?, EffectivePermission::Edit);
    assert!(client.has_write_permission("Dave", &fixture.rights)?);
    assert_eq!(client.effective_permission("alice", &fixture.rights)?, EffectivePermission::None);
    assert!(!client.has_read_permission("alice", &fixture.rights)?);
    Ok(())
}

#[test]
fn folder_entries_reach_every_child() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let client = client(&fixture)?;
    let lesson = fixture.add_document("lesson-1.xml");

    client.apply_permissions(&fixture.folder, &fixture.rights, [("carol", EffectivePermission::Edit)])?;

    assert_eq!(client.effective_permission("carol", &lesson)?, EffectivePermission::Edit);
    assert!(fixture.repo.local_acl(&lesson.path)?.is_empty());
    Ok(())
}

#[test]
fn listing_reports_everyone_as_star() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let client = client(&fixture)?;

    client.apply_permissions(
        &fixture.folder,
        &fixture.rights,
        [
            ("members", EffectivePermission::View),
            ("alice", EffectivePermission::Take),
            ("bob", EffectivePermission::Edit),
        ],
    )?;

    let (folder, _) = fixture.refresh();
    let listing = client.permissions(&folder)?;
    assert_eq!(listing.get("*"), EffectivePermission::View);
    assert_eq!(listing.get("bob"), EffectivePermission::Edit);
    assert_eq!(listing.get(ADMIN), EffectivePermission::Edit);
    // The overlay lives on the rights document, not the folder.
    assert_eq!(listing.get("alice"), EffectivePermission::View);

    let listing = client.permissions(&fixture.rights)?;
    assert_eq!(listing.get("alice"), EffectivePermission::Take);
    Ok(())
}

#[test]
fn corrupt_overlay_does_not_block_changes() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::new();
    let client = client(&fixture)?;
    fixture.put_raw_overlay("{not json");

    client.apply_permissions(&fixture.folder, &fixture.rights, [("alice", EffectivePermission::View)])?;
    assert_eq!(client.effective_permission("alice", &fixture.rights)?, EffectivePermission::View);

    client.apply_permissions(&fixture.folder, &fixture.rights, [("alice", EffectivePermission::Take)])?;
    assert_eq!(client.effective_permission("alice", &fixture.rights)?, EffectivePermission::Take);
    Ok(())
}

#[test]
fn protected_principals_cannot_be_changed() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let client = client(&fixture)?;

    for principal in [ADMIN, ADMINISTRATORS] {
        let result = client.apply_permissions(
            &fixture.folder,
            &fixture.rights,
            [(principal, EffectivePermission::None)],
        );
        assert!(matches!(result, Err(ClientError::InvalidArgument(_))), "{principal}");
    }
    assert_eq!(fixture.local_level(ADMIN), Some(AccessLevel::Everything));
    assert_eq!(fixture.repo.stats().acl_writes, 0);
    Ok(())
}

#[test]
fn administrator_in_other_case_is_a_regular_user() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let client = client(&fixture)?;

    client.apply_permissions(
        &fixture.folder,
        &fixture.rights,
        [("administrator", EffectivePermission::View)],
    )?;
    assert_eq!(fixture.local_level("administrator"), Some(AccessLevel::Read));
    assert_eq!(fixture.local_level(ADMIN), Some(AccessLevel::Everything));

    client.apply_permissions(
        &fixture.folder,
        &fixture.rights,
        [("administrator", EffectivePermission::None)],
    )?;
    assert_eq!(fixture.local_level("administrator"), None);
    assert_eq!(fixture.local_level(ADMIN), Some(AccessLevel::Everything));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn unrelated_entries_survive_changes(
        unrelated in unrelated_aces(6),
        prior in effective_permission(),
        target in effective_permission(),
    ) {
        let fixture = TestFixture::new();
        let client = client(&fixture).unwrap();
        client
            .apply_permissions(&fixture.folder, &fixture.rights, [("alice", prior)])
            .unwrap();

        let mut entries = fixture.local_entries();
        entries.extend(unrelated.iter().cloned());
        fixture.set_folder_entries(entries);

        client
            .apply_permissions(&fixture.folder, &fixture.rights, [("alice", target)])
            .unwrap();

        let after = fixture.local_entries();
        prop_assert!(after.contains(&Ace::grant(ADMIN, AccessLevel::Everything)));
        prop_assert!(after.contains(&Ace::grant(ADMINISTRATORS, AccessLevel::Everything)));
        for ace in &unrelated {
            prop_assert!(after.contains(ace), "lost {:?}", ace);
        }
        prop_assert_eq!(
            client.effective_permission("alice", &fixture.rights).unwrap(),
            target
        );
    }
}
