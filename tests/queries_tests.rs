use chrono::{Duration, Utc};
use plaza::db::*;
use plaza::model::*;
use plaza::queries::event_queries;

fn setup() -> (rusqlite::Connection, Region, User, Course) {
    let conn = schema::test_connection();
    let tenant = Tenant::create("Commons".into());
    tenant_repo::insert(&conn, &tenant).unwrap();
    let region = Region::create("Testivalley".into(), tenant.id);
    region_repo::insert(&conn, &region).unwrap();

    let user = User::create("ada".into());
    user_repo::insert(&conn, &user).unwrap();

    let course = Course::create(
        "Stargazing".into(),
        region.id,
        Some(tenant.id),
        vec![Role::Participant, Role::Team],
        user.id,
        Utc::now(),
    );
    course_repo::insert(&conn, &course).unwrap();

    (conn, region, user, course)
}

fn add_event(
    conn: &rusqlite::Connection,
    region: &Region,
    course: Id<Course>,
    creator: Id<User>,
    title: &str,
    start_offset: Duration,
) -> Event {
    let now = Utc::now();
    let event = Event::create(
        title.into(),
        region.id,
        None,
        Some(course),
        creator,
        now + start_offset,
        now + start_offset + Duration::hours(1),
    );
    event_repo::insert(conn, &event).unwrap();
    event
}

#[test]
fn future_pointers_sorted_earliest_first() {
    let (conn, region, user, course) = setup();
    let later = add_event(&conn, &region, course.id, user.id, "Later", Duration::days(9));
    let soon = add_event(&conn, &region, course.id, user.id, "Soon", Duration::days(2));
    add_event(&conn, &region, course.id, user.id, "Past", Duration::days(-2));

    let pointers = event_queries::future_pointers(&conn, course.id, Utc::now()).unwrap();
    assert_eq!(pointers.len(), 2);
    assert_eq!(pointers[0].id, soon.id);
    assert_eq!(pointers[0].title, "Soon");
    assert_eq!(pointers[1].id, later.id);
}

#[test]
fn future_pointers_empty_without_future_events() {
    let (conn, region, user, course) = setup();
    add_event(&conn, &region, course.id, user.id, "Past", Duration::days(-2));

    let pointers = event_queries::future_pointers(&conn, course.id, Utc::now()).unwrap();
    assert!(pointers.is_empty());
}

#[test]
fn future_pointers_scoped_to_course() {
    let (conn, region, user, course) = setup();
    let other = Course::create(
        "Other".into(),
        region.id,
        None,
        vec![Role::Participant],
        user.id,
        Utc::now(),
    );
    course_repo::insert(&conn, &other).unwrap();
    add_event(&conn, &region, other.id, user.id, "Elsewhere", Duration::days(1));

    let pointers = event_queries::future_pointers(&conn, course.id, Utc::now()).unwrap();
    assert!(pointers.is_empty());
}

#[test]
fn last_pointer_picks_most_recent_past() {
    let (conn, region, user, course) = setup();
    add_event(&conn, &region, course.id, user.id, "Ancient", Duration::days(-30));
    let recent = add_event(&conn, &region, course.id, user.id, "Recent", Duration::days(-3));
    add_event(&conn, &region, course.id, user.id, "Future", Duration::days(3));

    let pointer = event_queries::last_pointer(&conn, course.id, Utc::now()).unwrap().unwrap();
    assert_eq!(pointer.id, recent.id);
}

#[test]
fn last_pointer_none_without_past_events() {
    let (conn, region, user, course) = setup();
    add_event(&conn, &region, course.id, user.id, "Future", Duration::days(3));

    assert!(event_queries::last_pointer(&conn, course.id, Utc::now()).unwrap().is_none());
}
