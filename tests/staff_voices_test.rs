// Test voice registration in staves: sequential numbering, limits and layering

use std::rc::Rc;

use score_msr::msr::{
    MsrError, MsrSettings, Part, PartCounter, StaffKind, Voice, VoiceKind,
};

/// Helper to create part P1 with regular staff 1
fn make_part_with_staff(settings: MsrSettings) -> Part {
    let mut counter = PartCounter::new();
    let mut part = Part::new(Rc::new(settings), &mut counter, 1, "P1");
    part.add_regular_staff_by_number(2, StaffKind::Regular, 1).unwrap();
    part
}

fn sequential_number(part: &Part, voice_number: i32) -> Option<usize> {
    part.fetch_voice(1, voice_number)
        .and_then(|voice| voice.staff_sequential_number())
}

#[test]
fn test_sequential_numbers_follow_voice_numbers() {
    let mut part = make_part_with_staff(MsrSettings::default());
    part.create_regular_voice_in_staff(3, 1, 2, "1").unwrap();
    part.create_regular_voice_in_staff(4, 1, 1, "1").unwrap();

    // registration order first
    assert_eq!(sequential_number(&part, 2), Some(1));
    assert_eq!(sequential_number(&part, 1), Some(2));

    part.fetch_staff_by_number_mut(1)
        .unwrap()
        .assign_sequential_numbers_to_regular_voices(5);

    assert_eq!(sequential_number(&part, 1), Some(1));
    assert_eq!(sequential_number(&part, 2), Some(2));
}

#[test]
fn test_sequential_numbering_is_idempotent() {
    let mut part = make_part_with_staff(MsrSettings::default());
    for voice_number in [4, 2, 3] {
        part.create_regular_voice_in_staff(3, 1, voice_number, "1").unwrap();
    }

    part.assign_sequential_numbers_to_regular_voices(10);
    let first: Vec<Option<usize>> = [2, 3, 4].iter().map(|&n| sequential_number(&part, n)).collect();

    part.assign_sequential_numbers_to_regular_voices(11);
    let second: Vec<Option<usize>> = [2, 3, 4].iter().map(|&n| sequential_number(&part, n)).collect();

    assert_eq!(first, vec![Some(1), Some(2), Some(3)]);
    assert_eq!(first, second);

    let staff = part.fetch_staff_by_number(1).unwrap();
    let ordered: Vec<i32> = staff.regular_voices().map(|v| v.number()).collect();
    assert_eq!(ordered, vec![2, 3, 4]);
}

#[test]
fn test_regular_voice_overflow_is_surfaced() {
    let mut part = make_part_with_staff(MsrSettings::default());
    for voice_number in 1..=4 {
        part.create_regular_voice_in_staff(3, 1, voice_number, "1").unwrap();
    }

    let err = part.create_regular_voice_in_staff(7, 1, 5, "1").unwrap_err();

    assert_eq!(
        err,
        MsrError::RegularVoiceOverflow {
            staff: "Part_POne_Staff_One".to_string(),
            voice_number: 5,
            max: 4,
            line: 7,
        }
    );
    assert!(!err.is_fatal());
    assert_eq!(part.fetch_staff_by_number(1).unwrap().regular_voices_count(), 4);
    assert_eq!(part.all_voices().len(), 4);
}

#[test]
fn test_duplicate_regular_voice_number() {
    let mut part = make_part_with_staff(MsrSettings::default());
    part.create_regular_voice_in_staff(3, 1, 1, "1").unwrap();

    let err = part.create_regular_voice_in_staff(4, 1, 1, "1").unwrap_err();
    assert!(matches!(err, MsrError::DuplicateVoiceNumber { voice_number: 1, .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_voice_in_unknown_staff() {
    let mut part = make_part_with_staff(MsrSettings::default());

    assert!(matches!(
        part.create_regular_voice_in_staff(3, 9, 1, "1"),
        Err(MsrError::UnknownStaff { staff_number: 9, .. })
    ));
}

#[test]
fn test_special_voices_surround_their_regular_voice() {
    let mut part = make_part_with_staff(MsrSettings::default());
    part.create_regular_voice_in_staff(3, 1, 1, "1").unwrap();
    part.create_regular_voice_in_staff(4, 1, 2, "1").unwrap();
    part.create_voice_figured_bass_voice(5, 1, 1, "1").unwrap();
    part.create_voice_harmonies_voice(6, 1, 2, "1").unwrap();
    part.create_voice_harmonies_voice(7, 1, 1, "1").unwrap();

    let staff = part.fetch_staff_by_number(1).unwrap();
    let kinds: Vec<(i32, VoiceKind)> = staff.all_voices().map(|v| (v.number(), v.kind())).collect();

    assert_eq!(
        kinds,
        vec![
            (21, VoiceKind::Harmonies),
            (1, VoiceKind::Regular),
            (41, VoiceKind::FiguredBass),
            (22, VoiceKind::Harmonies),
            (2, VoiceKind::Regular),
        ]
    );
    assert_eq!(staff.regular_voices_count(), 2);
    assert_eq!(
        staff.all_voice_names()[0],
        "Part_POne_Staff_One_Voice_One_HARMONIES"
    );

    // the part registry keeps registration order
    let registered: Vec<i32> = part.all_voices().iter().map(|v| v.voice_number).collect();
    assert_eq!(registered, vec![1, 2, 41, 22, 21]);
}

#[test]
fn test_fetch_first_regular_voice() {
    let mut part = make_part_with_staff(MsrSettings::default());

    assert!(matches!(
        part.fetch_staff_by_number(1).unwrap().fetch_first_regular_voice(3),
        Err(MsrError::NoRegularVoice { staff_number: 1, line: 3, .. })
    ));

    part.create_regular_voice_in_staff(4, 1, 3, "1").unwrap();
    part.create_regular_voice_in_staff(5, 1, 2, "1").unwrap();
    let staff = part.fetch_staff_by_number(1).unwrap();

    assert_eq!(staff.fetch_first_regular_voice(6).unwrap().number(), 3);
    assert_eq!(staff.fetch_regular_voice_by_number(6, 2).unwrap().number(), 2);
    assert!(staff.fetch_regular_voice_by_number(6, 1).is_none());
}

#[test]
fn test_registering_external_voices() {
    let mut part = make_part_with_staff(MsrSettings::default());

    let dynamics = Voice::new(9, VoiceKind::Dynamics, "dynamics", 1, "1");
    assert_eq!(part.register_voice_in_staff(2, 1, dynamics).unwrap(), None);

    let regular = Voice::new(3, VoiceKind::Regular, "Part_POne_Staff_One_Voice_Three", 1, "1");
    let registered = part.register_voice_in_staff(3, 1, regular).unwrap().unwrap();
    assert_eq!(registered.voice_number, 3);
    assert_eq!(part.all_voices().len(), 1);

    // same name again
    let again = Voice::new(4, VoiceKind::Regular, "Part_POne_Staff_One_Voice_Three", 1, "1");
    assert!(matches!(
        part.register_voice_in_staff(4, 1, again),
        Err(MsrError::DuplicateVoiceIdentity { line: 4, .. })
    ));
    assert_eq!(part.all_voices().len(), 1);
}
