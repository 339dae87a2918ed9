// Test part measure bookkeeping and finalization

use std::rc::Rc;

use score_msr::msr::{
    InstrumentNamesMaxLengths, MeasureImplicitKind, MsrError, MsrSettings, NoteContent, NoteKind,
    Part, PartCounter, SoloNoteOrRest, StaffKind, WholeNotes, MEASURE_WHOLE_NOTES_FALLBACK,
};

fn make_part() -> Part {
    let mut counter = PartCounter::new();
    Part::new(Rc::new(MsrSettings::default()), &mut counter, 1, "P1")
}

#[test]
fn test_number_of_measures_resizes_whole_notes_vector() {
    let mut part = make_part();

    part.set_part_number_of_measures(3);
    assert_eq!(part.number_of_measures(), 3);
    assert_eq!(part.measures_whole_notes_vector().len(), 4);
    assert!(part.measures_whole_notes_vector().iter().all(|w| w.is_zero()));

    part.register_ordinal_measure_number_whole_notes(2, 1, WholeNotes::new(3, 4))
        .unwrap();

    // shrinking keeps the contents
    part.set_part_number_of_measures(2);
    assert_eq!(part.measures_whole_notes_vector().len(), 4);
    assert_eq!(part.measures_whole_notes_vector()[0], WholeNotes::new(3, 4));

    // growing discards them
    part.set_part_number_of_measures(5);
    assert_eq!(part.measures_whole_notes_vector().len(), 6);
    assert!(part.measures_whole_notes_vector().iter().all(|w| w.is_zero()));
}

#[test]
fn test_register_then_fetch_measure_whole_notes() {
    let mut part = make_part();
    part.set_part_number_of_measures(4);

    part.register_ordinal_measure_number_whole_notes(10, 3, WholeNotes::new(5, 8))
        .unwrap();

    assert_eq!(
        part.fetch_part_measures_whole_notes_vector_at(11, 2).unwrap(),
        WholeNotes::new(5, 8)
    );
    assert_eq!(
        part.fetch_part_measures_whole_notes_vector_at(11, 0).unwrap(),
        WholeNotes::zero()
    );
}

#[test]
fn test_fetch_out_of_range_measure_whole_notes() {
    let mut part = make_part();
    part.set_part_number_of_measures(3);

    let err = part
        .fetch_part_measures_whole_notes_vector_at(20, 5)
        .unwrap_err();
    match err {
        MsrError::MeasureIndexOutOfRange { index, size, line, .. } => {
            assert_eq!(index, 5);
            assert_eq!(size, 4);
            assert_eq!(line, 20);
        }
        other => panic!("unexpected error {:?}", other),
    }

    let (numerator, denominator) = MEASURE_WHOLE_NOTES_FALLBACK;
    assert_eq!(
        part.fetch_part_measures_whole_notes_vector_at_or_fallback(20, 5),
        WholeNotes::new(numerator, denominator)
    );
    assert_eq!(
        part.fetch_part_measures_whole_notes_vector_at_or_fallback(20, 5),
        WholeNotes::new(15, 8)
    );
}

#[test]
fn test_register_ordinal_out_of_range() {
    let mut part = make_part();
    part.set_part_number_of_measures(2);

    let zero = part.register_ordinal_measure_number_whole_notes(1, 0, WholeNotes::new(1, 1));
    assert!(matches!(
        zero,
        Err(MsrError::MeasureIndexOutOfRange { index: -1, .. })
    ));

    let past_end = part.register_ordinal_measure_number_whole_notes(1, 9, WholeNotes::new(1, 1));
    assert!(matches!(
        past_end,
        Err(MsrError::MeasureIndexOutOfRange { index: 8, .. })
    ));
}

#[test]
fn test_first_measure_number_is_latched() {
    let mut part = make_part();
    part.add_regular_staff_by_number(1, StaffKind::Regular, 1).unwrap();
    part.create_regular_voice_in_staff(2, 1, 1, "0").unwrap();

    assert_eq!(part.first_measure_number(), None);

    part.create_measure_and_append_to_part(3, "0", MeasureImplicitKind::Yes);
    part.create_measure_and_append_to_part(4, "1", MeasureImplicitKind::No);
    part.create_measure_and_append_to_part(5, "2", MeasureImplicitKind::No);

    assert_eq!(part.first_measure_number(), Some("0"));
    assert_eq!(part.current_measure_number(), "2");

    let voice = part.fetch_voice(1, 1).unwrap();
    let purist: Vec<i32> = voice.measures().iter().map(|m| m.purist_number).collect();
    assert_eq!(purist, vec![0, 1, 2]);
}

#[test]
fn test_position_in_measure_never_negative() {
    let mut part = make_part();

    part.increment_part_current_position_in_measure(1, WholeNotes::new(1, 4))
        .unwrap();
    part.decrement_part_current_position_in_measure(2, WholeNotes::new(1, 4))
        .unwrap();
    assert!(part.current_position_in_measure().is_zero());

    let result = part.decrement_part_current_position_in_measure(3, WholeNotes::new(1, 8));
    assert!(matches!(
        result,
        Err(MsrError::NegativePositionInMeasure { line: 3, .. })
    ));
    assert!(part.current_position_in_measure().is_zero());
}

#[test]
fn test_shortest_note_is_tracked_from_notes() {
    let mut part = make_part();
    part.add_regular_staff_by_number(1, StaffKind::Regular, 1).unwrap();
    part.create_regular_voice_in_staff(2, 1, 1, "1").unwrap();

    for whole_notes in [WholeNotes::new(1, 4), WholeNotes::new(1, 16), WholeNotes::new(1, 2)] {
        part.append_note_to_voice(3, 1, 1, &NoteContent::new(NoteKind::Regular, whole_notes, "c"))
            .unwrap();
    }

    assert_eq!(part.shortest_note_whole_notes(), Some(WholeNotes::new(1, 16)));
}

#[test]
fn test_finalize_part_identifies_solo_notes() {
    let mut part = make_part();
    part.add_regular_staff_by_number(1, StaffKind::Regular, 1).unwrap();
    part.create_regular_voice_in_staff(2, 1, 1, "1").unwrap();
    part.create_regular_voice_in_staff(3, 1, 2, "1").unwrap();
    part.create_measure_and_append_to_part(4, "1", MeasureImplicitKind::No);

    let half = WholeNotes::new(1, 2);
    part.append_note_to_voice(5, 1, 1, &NoteContent::new(NoteKind::Regular, half, "a2"))
        .unwrap();
    part.append_note_to_voice(6, 1, 1, &NoteContent::new(NoteKind::Regular, half, "b2"))
        .unwrap();
    part.append_note_to_voice(7, 1, 2, &NoteContent::rest(half)).unwrap();
    part.append_note_to_voice(8, 1, 2, &NoteContent::skip(half)).unwrap();

    let mut max_lengths = InstrumentNamesMaxLengths::default();
    part.finalize_part(9, &mut max_lengths).unwrap();
    assert!(part.is_finalized());

    let sequence = part.measures_slices_sequence();
    assert_eq!(sequence.origin, part.combined_name());
    assert_eq!(sequence.len(), 1);

    let slice = &sequence.slices[0];
    assert_eq!(slice.measure_number, "1");
    assert_eq!(slice.summaries.len(), 2);

    let first: Vec<SoloNoteOrRest> = slice.summaries[0].notes.iter().map(|n| n.solo).collect();
    assert_eq!(first, vec![SoloNoteOrRest::No, SoloNoteOrRest::Yes]);

    let second: Vec<SoloNoteOrRest> = slice.summaries[1].notes.iter().map(|n| n.solo).collect();
    assert_eq!(second, vec![SoloNoteOrRest::No, SoloNoteOrRest::Unknown]);

    assert!(sequence.to_json().unwrap().contains("\"measure_number\": \"1\""));
}

#[test]
fn test_finalize_twice_is_an_error() {
    let mut part = make_part();
    let mut max_lengths = InstrumentNamesMaxLengths::default();

    // a part without staves still finalizes
    part.finalize_part(1, &mut max_lengths).unwrap();
    assert!(part.measures_slices_sequence().is_empty());

    let again = part.finalize_part_clone(2, &mut max_lengths);
    assert!(matches!(again, Err(MsrError::AlreadyFinalized { line: 2, .. })));
}

#[test]
fn test_finalized_voice_rejects_notes() {
    let mut part = make_part();
    part.add_regular_staff_by_number(1, StaffKind::Regular, 1).unwrap();
    part.create_regular_voice_in_staff(2, 1, 1, "1").unwrap();
    part.finalize_part(3, &mut InstrumentNamesMaxLengths::default())
        .unwrap();

    let result = part.append_note_to_voice(4, 1, 1, &NoteContent::rest(WholeNotes::new(1, 4)));
    assert!(matches!(result, Err(MsrError::AlreadyFinalized { .. })));
}

#[test]
fn test_finalize_with_mismatched_staves() {
    let mut part = make_part();
    part.add_regular_staff_by_number(1, StaffKind::Regular, 1).unwrap();
    part.add_regular_staff_by_number(1, StaffKind::Regular, 2).unwrap();
    part.create_regular_voice_in_staff(2, 1, 1, "1").unwrap();
    part.create_regular_voice_in_staff(2, 2, 1, "1").unwrap();

    part.append_note_to_voice(3, 1, 1, &NoteContent::rest(WholeNotes::new(1, 1)))
        .unwrap();
    part.create_measure_and_append_to_part(4, "2", MeasureImplicitKind::No);
    part.append_note_to_voice(5, 1, 1, &NoteContent::rest(WholeNotes::new(1, 1)))
        .unwrap();
    part.append_note_to_voice(6, 2, 1, &NoteContent::rest(WholeNotes::new(1, 1)))
        .unwrap();

    // staff 1 has measures 1 and 2, staff 2 only measure 2
    let result = part.finalize_part(7, &mut InstrumentNamesMaxLengths::default());
    assert!(result.is_err());
}
