use chrono::{Duration, Utc};
use plaza::db::*;
use plaza::denorm::*;
use plaza::model::*;

fn setup() -> (rusqlite::Connection, Tenant, Region) {
    let conn = schema::test_connection();
    let tenant = Tenant::create("Commons".into());
    tenant_repo::insert(&conn, &tenant).unwrap();
    let region = Region::create("Testivalley".into(), tenant.id);
    region_repo::insert(&conn, &region).unwrap();
    (conn, tenant, region)
}

fn new_user(conn: &rusqlite::Connection, name: &str) -> User {
    let user = User::create(name.into());
    user_repo::insert(conn, &user).unwrap();
    user
}

fn new_course(conn: &rusqlite::Connection, region: &Region, creator: Id<User>) -> Course {
    let course = Course::create(
        "Bike repair".into(),
        region.id,
        Some(region.tenant),
        vec![Role::Participant, Role::Mentor, Role::Host, Role::Team],
        creator,
        Utc::now(),
    );
    course_repo::insert(conn, &course).unwrap();
    course
}

fn enroll(conn: &rusqlite::Connection, course: Id<Course>, user: Id<User>, role: Role) {
    course_repo::add_member(conn, course, user).unwrap();
    course_repo::add_member_role(conn, course, user, role).unwrap();
}

fn new_event(
    conn: &rusqlite::Connection,
    region: &Region,
    course: Option<Id<Course>>,
    creator: Id<User>,
    start_offset: Duration,
) -> Event {
    let now = Utc::now();
    let event = Event::create(
        "Session".into(),
        region.id,
        Some(region.tenant),
        course,
        creator,
        now + start_offset,
        now + start_offset + Duration::hours(2),
    );
    event_repo::insert(conn, &event).unwrap();
    event
}

// ==========================================================================
// COURSE INTEREST
// ==========================================================================

#[test]
fn update_interested_matches_member_count() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let bob = new_user(&conn, "bob");
    let course = new_course(&conn, &region, ada.id);
    enroll(&conn, course.id, ada.id, Role::Team);
    enroll(&conn, course.id, bob.id, Role::Participant);

    let outcome = course_denorm::update_interested(&conn, course.id).unwrap();
    assert_eq!(outcome.writes(), 1);

    let found = course_repo::find_by_id(&conn, course.id).unwrap().unwrap();
    assert_eq!(found.interested, 2);
}

#[test]
fn update_interested_is_idempotent() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let course = new_course(&conn, &region, ada.id);
    enroll(&conn, course.id, ada.id, Role::Participant);

    course_denorm::update_interested(&conn, course.id).unwrap();
    let second = course_denorm::update_interested(&conn, course.id).unwrap();
    assert_eq!(second, Outcome::Converged { writes: 0 });
}

#[test]
fn update_interested_converges_after_later_mutation() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let bob = new_user(&conn, "bob");
    let course = new_course(&conn, &region, ada.id);
    enroll(&conn, course.id, ada.id, Role::Participant);

    course_denorm::update_interested(&conn, course.id).unwrap();
    enroll(&conn, course.id, bob.id, Role::Participant);
    course_denorm::update_interested(&conn, course.id).unwrap();

    let found = course_repo::find_by_id(&conn, course.id).unwrap().unwrap();
    assert_eq!(found.interested, found.members.len() as i64);
}

#[test]
fn update_interested_missing_course_is_noop() {
    let (conn, _, _) = setup();
    let outcome = course_denorm::update_interested(&conn, Id::generate()).unwrap();
    assert_eq!(outcome, Outcome::Missing);
}

// ==========================================================================
// COURSE EDITORS
// ==========================================================================

#[test]
fn update_groups_enforces_editors_invariant() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let bob = new_user(&conn, "bob");
    let course = new_course(&conn, &region, ada.id);
    let organizers: Vec<Id<Group>> = vec![Id::generate()];
    course_repo::set_group_organizers(&conn, course.id, &organizers).unwrap();
    enroll(&conn, course.id, ada.id, Role::Team);
    enroll(&conn, course.id, bob.id, Role::Participant);

    course_denorm::update_groups(&conn, course.id).unwrap();

    let found = course_repo::find_by_id(&conn, course.id).unwrap().unwrap();
    let expected = sets::union(&[organizers[0].value], &[ada.id.value]);
    assert_eq!(found.editors, expected);
    assert_eq!(found.editors, found.compute_editors());
}

#[test]
fn update_groups_is_idempotent() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let course = new_course(&conn, &region, ada.id);
    enroll(&conn, course.id, ada.id, Role::Team);

    course_denorm::update_groups(&conn, course.id).unwrap();
    let second = course_denorm::update_groups(&conn, course.id).unwrap();
    assert_eq!(second, Outcome::Converged { writes: 0 });
}

#[test]
fn update_groups_enqueues_event_recompute() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let course = new_course(&conn, &region, ada.id);
    enroll(&conn, course.id, ada.id, Role::Team);
    let event = new_event(&conn, &region, Some(course.id), ada.id, Duration::days(3));

    course_denorm::update_groups(&conn, course.id).unwrap();
    assert_eq!(outbox_repo::pending(&conn).unwrap().len(), 1);

    let ran = outbox::drain(&conn, Utc::now()).unwrap();
    assert_eq!(ran, 1);
    assert!(outbox_repo::pending(&conn).unwrap().is_empty());

    let found = event_repo::find_by_id(&conn, event.id).unwrap().unwrap();
    assert!(found.editors.contains(&ada.id.value));
}

#[test]
fn update_groups_missing_course_enqueues_nothing() {
    let (conn, _, _) = setup();
    let outcome = course_denorm::update_groups(&conn, Id::generate()).unwrap();
    assert_eq!(outcome, Outcome::Missing);
    assert!(outbox_repo::pending(&conn).unwrap().is_empty());
}

// ==========================================================================
// EVENT GROUP INHERITANCE
// ==========================================================================

#[test]
fn future_event_inherits_live_course_groups() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let course = new_course(&conn, &region, ada.id);
    let promoting: Vec<Id<Group>> = vec![Id::generate()];
    course_repo::set_groups(&conn, course.id, &promoting).unwrap();
    course_repo::set_editors_if_changed(&conn, course.id, &[ada.id.value]).unwrap();

    let own_group: Id<Group> = Id::generate();
    let mut event = new_event(&conn, &region, Some(course.id), ada.id, Duration::days(5));
    event.groups.push(own_group);
    event_repo::set_groups(&conn, event.id, &event.groups).unwrap();

    event_denorm::update_groups(&conn, event.id, Utc::now()).unwrap();

    let found = event_repo::find_by_id(&conn, event.id).unwrap().unwrap();
    assert_eq!(found.course_groups, promoting);
    assert_eq!(found.all_groups.len(), 2);
    assert!(found.all_groups.contains(&promoting[0]));
    assert!(found.all_groups.contains(&own_group));
    assert!(found.editors.contains(&ada.id.value));
}

#[test]
fn past_event_keeps_frozen_course_groups() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let course = new_course(&conn, &region, ada.id);
    let frozen: Id<Group> = Id::generate();
    let event = new_event(&conn, &region, Some(course.id), ada.id, Duration::days(-5));
    event_repo::set_derived_if_changed(
        &conn,
        event.id,
        &[],
        Some(&[frozen.value]),
        &[frozen.value],
    )
    .unwrap();

    // The course's promoting groups change after the event happened.
    let newer: Vec<Id<Group>> = vec![Id::generate()];
    course_repo::set_groups(&conn, course.id, &newer).unwrap();
    course_repo::set_editors_if_changed(&conn, course.id, &[ada.id.value]).unwrap();

    event_denorm::update_groups(&conn, event.id, Utc::now()).unwrap();

    let found = event_repo::find_by_id(&conn, event.id).unwrap().unwrap();
    assert_eq!(found.course_groups, vec![frozen]);
    assert_eq!(found.all_groups, vec![frozen]);
    // Editors are not frozen, only the group inheritance is.
    assert!(found.editors.contains(&ada.id.value));
}

#[test]
fn past_event_recompute_is_idempotent() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let course = new_course(&conn, &region, ada.id);
    let event = new_event(&conn, &region, Some(course.id), ada.id, Duration::days(-5));

    event_denorm::update_groups(&conn, event.id, Utc::now()).unwrap();
    let second = event_denorm::update_groups(&conn, event.id, Utc::now()).unwrap();
    assert_eq!(second, Outcome::Converged { writes: 0 });
}

#[test]
fn courseless_event_editors_include_creator() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let organizers: Vec<Id<Group>> = vec![Id::generate()];
    let event = new_event(&conn, &region, None, ada.id, Duration::days(2));
    event_repo::set_group_organizers(&conn, event.id, &organizers).unwrap();

    event_denorm::update_groups(&conn, event.id, Utc::now()).unwrap();

    let found = event_repo::find_by_id(&conn, event.id).unwrap().unwrap();
    assert!(found.editors.contains(&ada.id.value));
    assert!(found.editors.contains(&organizers[0].value));
}

#[test]
fn event_with_missing_course_is_integrity_error() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let event = new_event(&conn, &region, Some(Id::generate()), ada.id, Duration::days(2));

    let result = event_denorm::update_groups(&conn, event.id, Utc::now());
    assert!(matches!(
        result,
        Err(plaza::error::PlazaError::NotFound { .. })
    ));
}

#[test]
fn missing_event_is_noop() {
    let (conn, _, _) = setup();
    let outcome = event_denorm::update_groups(&conn, Id::generate(), Utc::now()).unwrap();
    assert_eq!(outcome, Outcome::Missing);
}

// ==========================================================================
// EVENT POINTERS (next/last)
// ==========================================================================

#[test]
fn update_next_event_sets_projections() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let course = new_course(&conn, &region, ada.id);
    let _old = new_event(&conn, &region, Some(course.id), ada.id, Duration::days(-10));
    let recent = new_event(&conn, &region, Some(course.id), ada.id, Duration::days(-1));
    let soon = new_event(&conn, &region, Some(course.id), ada.id, Duration::days(1));
    let _later = new_event(&conn, &region, Some(course.id), ada.id, Duration::days(6));

    course_denorm::update_next_event(&conn, course.id, Utc::now()).unwrap();

    let found = course_repo::find_by_id(&conn, course.id).unwrap().unwrap();
    assert_eq!(found.future_events, 2);
    assert_eq!(found.next_event.unwrap().id, soon.id);
    assert_eq!(found.last_event.unwrap().id, recent.id);
}

#[test]
fn update_next_event_clears_when_no_events() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let course = new_course(&conn, &region, ada.id);

    course_denorm::update_next_event(&conn, course.id, Utc::now()).unwrap();

    let found = course_repo::find_by_id(&conn, course.id).unwrap().unwrap();
    assert_eq!(found.future_events, 0);
    assert!(found.next_event.is_none());
    assert!(found.last_event.is_none());
}

#[test]
fn update_next_event_missing_course_is_noop() {
    let (conn, _, _) = setup();
    course_denorm::update_next_event(&conn, Id::generate(), Utc::now()).unwrap();
}

#[test]
fn sweep_covers_all_courses() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let first = new_course(&conn, &region, ada.id);
    let second = new_course(&conn, &region, ada.id);
    new_event(&conn, &region, Some(first.id), ada.id, Duration::days(1));
    new_event(&conn, &region, Some(second.id), ada.id, Duration::days(2));

    course_denorm::sweep_next_events(&conn, Utc::now()).unwrap();

    assert_eq!(course_repo::find_by_id(&conn, first.id).unwrap().unwrap().future_events, 1);
    assert_eq!(course_repo::find_by_id(&conn, second.id).unwrap().unwrap().future_events, 1);
}

// ==========================================================================
// REGION COUNTERS
// ==========================================================================

#[test]
fn region_counters_reflect_live_state() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let course = new_course(&conn, &region, ada.id);
    new_course(&conn, &region, ada.id);
    new_event(&conn, &region, Some(course.id), ada.id, Duration::days(1));
    new_event(&conn, &region, Some(course.id), ada.id, Duration::days(-1));

    region_denorm::update_counters(&conn, region.id, Utc::now()).unwrap();

    let found = region_repo::find_by_id(&conn, region.id).unwrap().unwrap();
    assert_eq!(found.course_count, 2);
    assert_eq!(found.future_event_count, 1);

    let second = region_denorm::update_counters(&conn, region.id, Utc::now()).unwrap();
    assert_eq!(second, Outcome::Converged { writes: 0 });
}

#[test]
fn region_counters_missing_region_is_noop() {
    let (conn, _, _) = setup();
    let outcome = region_denorm::update_counters(&conn, Id::generate(), Utc::now()).unwrap();
    assert_eq!(outcome, Outcome::Missing);
}

// ==========================================================================
// USER BADGES / TENANTS
// ==========================================================================

#[test]
fn badges_are_groups_plus_self() {
    let (conn, _, _) = setup();
    let ada = new_user(&conn, "ada");
    let bakers = Group::create("Bakers".into());
    let welders = Group::create("Welders".into());
    group_repo::insert(&conn, &bakers).unwrap();
    group_repo::insert(&conn, &welders).unwrap();
    group_repo::add_member(&conn, bakers.id, ada.id).unwrap();
    group_repo::add_member(&conn, welders.id, ada.id).unwrap();

    user_denorm::update_badges(&conn, ada.id).unwrap();

    let found = user_repo::find_by_id(&conn, ada.id).unwrap().unwrap();
    assert_eq!(found.badges.len(), 3);
    assert!(found.badges.contains(&ada.id.value));
    assert!(found.badges.contains(&bakers.id.value));
    assert!(found.badges.contains(&welders.id.value));
    assert_eq!(found.groups.len(), 2);

    let second = user_denorm::update_badges(&conn, ada.id).unwrap();
    assert_eq!(second, Outcome::Converged { writes: 0 });
}

#[test]
fn badges_shrink_after_leaving_group() {
    let (conn, _, _) = setup();
    let ada = new_user(&conn, "ada");
    let bakers = Group::create("Bakers".into());
    group_repo::insert(&conn, &bakers).unwrap();
    group_repo::add_member(&conn, bakers.id, ada.id).unwrap();
    user_denorm::update_badges(&conn, ada.id).unwrap();

    group_repo::remove_member(&conn, bakers.id, ada.id).unwrap();
    user_denorm::update_badges(&conn, ada.id).unwrap();

    let found = user_repo::find_by_id(&conn, ada.id).unwrap().unwrap();
    assert_eq!(found.badges, vec![ada.id.value]);
    assert!(found.groups.is_empty());
}

#[test]
fn tenant_links_derive_from_membership() {
    let (conn, tenant, _) = setup();
    let other = Tenant::create("Other org".into());
    tenant_repo::insert(&conn, &other).unwrap();
    let ada = new_user(&conn, "ada");
    tenant_repo::add_member(&conn, tenant.id, ada.id, false).unwrap();
    tenant_repo::add_member(&conn, other.id, ada.id, true).unwrap();

    user_denorm::update_tenants(&conn, ada.id).unwrap();

    let found = user_repo::find_by_id(&conn, ada.id).unwrap().unwrap();
    assert_eq!(found.tenants.len(), 2);
    let admin_link = found.tenants.iter().find(|l| l.tenant == other.id).unwrap();
    assert_eq!(admin_link.privileges, vec!["admin".to_string()]);

    let second = user_denorm::update_tenants(&conn, ada.id).unwrap();
    assert_eq!(second, Outcome::Converged { writes: 0 });
}

#[test]
fn update_badges_missing_user_is_noop() {
    let (conn, _, _) = setup();
    let outcome = user_denorm::update_badges(&conn, Id::generate()).unwrap();
    assert_eq!(outcome, Outcome::Missing);
}

// ==========================================================================
// OUTBOX
// ==========================================================================

#[test]
fn trigger_serde_roundtrip() {
    let trigger = Trigger::EventUpdateGroups { course: Id::generate() };
    let json = serde_json::to_string(&trigger).unwrap();
    let back: Trigger = serde_json::from_str(&json).unwrap();
    assert_eq!(back, trigger);
}

#[test]
fn drain_runs_selector_triggers() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let course = new_course(&conn, &region, ada.id);
    new_event(&conn, &region, Some(course.id), ada.id, Duration::days(1));
    let now = Utc::now();

    outbox::enqueue(&conn, &Trigger::RegionUpdateCounters { region: None }, now).unwrap();
    outbox::enqueue(&conn, &Trigger::CourseUpdateNextEvent { course: None }, now).unwrap();
    outbox::enqueue(&conn, &Trigger::UserUpdateBadges { user: ada.id }, now).unwrap();

    assert_eq!(outbox::drain(&conn, now).unwrap(), 3);

    let found_region = region_repo::find_by_id(&conn, region.id).unwrap().unwrap();
    assert_eq!(found_region.course_count, 1);
    assert_eq!(found_region.future_event_count, 1);
    let found_course = course_repo::find_by_id(&conn, course.id).unwrap().unwrap();
    assert_eq!(found_course.future_events, 1);
}

#[test]
fn drain_error_leaves_trigger_pending() {
    let (conn, _, region) = setup();
    let ada = new_user(&conn, "ada");
    let orphan_course: Id<Course> = Id::generate();
    new_event(&conn, &region, Some(orphan_course), ada.id, Duration::days(1));

    outbox::enqueue(
        &conn,
        &Trigger::EventUpdateGroups { course: orphan_course },
        Utc::now(),
    )
    .unwrap();

    assert!(outbox::drain(&conn, Utc::now()).is_err());
    assert_eq!(outbox_repo::pending(&conn).unwrap().len(), 1);
}
