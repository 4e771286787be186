use std::str::FromStr;

use chrono::Utc;
use plaza::model::*;
use uuid::Uuid;

// ==========================================================================
// ROLE TESTS
// ==========================================================================

#[test]
fn role_string_roundtrip() {
    for role in [Role::Participant, Role::Mentor, Role::Host, Role::Team] {
        assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
    }
}

#[test]
fn role_rejects_unknown_string() {
    assert!(Role::from_str("owner").is_err());
}

#[test]
fn role_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Role::Team).unwrap(), "\"team\"");
}

// ==========================================================================
// COURSE TESTS
// ==========================================================================

fn bare_course() -> Course {
    Course::create(
        "Sourdough baking".into(),
        Id::generate(),
        None,
        vec![Role::Participant, Role::Team],
        Id::generate(),
        Utc::now(),
    )
}

#[test]
fn new_course_has_empty_derived_fields() {
    let course = bare_course();
    assert!(course.editors.is_empty());
    assert_eq!(course.interested, 0);
    assert!(course.next_event.is_none());
    assert!(course.last_event.is_none());
    assert_eq!(course.future_events, 0);
}

#[test]
fn user_has_role_checks_member_roles() {
    let mut course = bare_course();
    let user: Id<User> = Id::generate();
    course.members.push(CourseMember {
        user,
        roles: vec![Role::Participant],
        comment: None,
    });

    assert!(course.user_has_role(user, Role::Participant));
    assert!(!course.user_has_role(user, Role::Team));
    assert!(!course.user_has_role(Id::generate(), Role::Participant));
}

#[test]
fn team_lists_only_team_members() {
    let mut course = bare_course();
    let alice: Id<User> = Id::generate();
    let bob: Id<User> = Id::generate();
    course.members.push(CourseMember {
        user: alice,
        roles: vec![Role::Team, Role::Participant],
        comment: None,
    });
    course.members.push(CourseMember {
        user: bob,
        roles: vec![Role::Participant],
        comment: None,
    });

    assert_eq!(course.team(), vec![alice]);
}

#[test]
fn compute_editors_unions_organizers_and_team() {
    let mut course = bare_course();
    let group: Id<Group> = Id::generate();
    let alice: Id<User> = Id::generate();
    course.group_organizers.push(group);
    course.members.push(CourseMember {
        user: alice,
        roles: vec![Role::Team],
        comment: None,
    });

    let editors = course.compute_editors();
    assert_eq!(editors.len(), 2);
    assert!(editors.contains(&group.value));
    assert!(editors.contains(&alice.value));
}

#[test]
fn compute_editors_is_canonical() {
    let mut course = bare_course();
    let group: Id<Group> = Id::generate();
    course.group_organizers.push(group);
    course.group_organizers.push(group);

    assert_eq!(course.compute_editors(), vec![group.value]);
}

// ==========================================================================
// EVENT TESTS
// ==========================================================================

#[test]
fn new_event_editors_seeded_with_creator() {
    let creator: Id<User> = Id::generate();
    let now = Utc::now();
    let event = Event::create(
        "First session".into(),
        Id::generate(),
        None,
        None,
        creator,
        now,
        now + chrono::Duration::hours(2),
    );
    assert_eq!(event.editors, vec![creator.value]);
    assert!(event.course_groups.is_empty());
    assert!(event.all_groups.is_empty());
}

#[test]
fn is_past_uses_start_boundary() {
    let now = Utc::now();
    let mut event = Event::create(
        "Session".into(),
        Id::generate(),
        None,
        None,
        Id::generate(),
        now + chrono::Duration::days(1),
        now + chrono::Duration::days(1),
    );
    assert!(!event.is_past(now));

    event.start = now - chrono::Duration::days(1);
    assert!(event.is_past(now));

    // An event starting exactly now is not past.
    event.start = now;
    assert!(!event.is_past(now));
}

#[test]
fn event_pointer_serde_roundtrip() {
    let now = Utc::now();
    let event = Event::create(
        "Session".into(),
        Id::generate(),
        None,
        None,
        Id::generate(),
        now,
        now,
    );
    let pointer = event.pointer();
    let json = serde_json::to_string(&pointer).unwrap();
    let back: EventPointer = serde_json::from_str(&json).unwrap();
    assert_eq!(back, pointer);
}

// ==========================================================================
// USER TESTS
// ==========================================================================

#[test]
fn may_edit_matches_badges_against_editors() {
    let mut user = User::create("ada".into());
    let group = Uuid::new_v4();
    user.badges.push(group);

    assert!(user.may_edit(&[user.id.value]));
    assert!(user.may_edit(&[group, Uuid::new_v4()]));
    assert!(!user.may_edit(&[Uuid::new_v4()]));
    assert!(!user.may_edit(&[]));
}

#[test]
fn tenant_link_serde_roundtrip() {
    let link = TenantLink {
        tenant: Id::generate(),
        privileges: vec!["admin".into()],
    };
    let json = serde_json::to_string(&link).unwrap();
    let back: TenantLink = serde_json::from_str(&json).unwrap();
    assert_eq!(back, link);
}
