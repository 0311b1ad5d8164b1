//! Unit tests for the shared descriptor table cursors

use crate::resource::descriptor_table::DescriptorTable;

#[test]
fn test_zero_capacity_rejected() {
    assert!(DescriptorTable::new(0).is_err());
}

#[test]
fn test_constant_cursor_wraps_after_exactly_capacity_slots() {
    let mut table = DescriptorTable::new(4).unwrap();

    assert_eq!(table.next_constant_slot(), 0);
    assert_eq!(table.next_constant_slot(), 1);
    assert_eq!(table.next_constant_slot(), 2);
    assert_eq!(table.next_constant_slot(), 3);
    // Capacity slots handed out: the cursor is back at the start
    assert_eq!(table.constant_cursor(), 0);
    assert_eq!(table.next_constant_slot(), 0);
}

#[test]
fn test_texture_ranges_are_contiguous_and_ascending() {
    let mut table = DescriptorTable::new(16).unwrap();

    assert_eq!(table.next_texture_range(1), 0);
    assert_eq!(table.next_texture_range(1), 1);
    assert_eq!(table.next_texture_range(1), 2);
    assert_eq!(table.next_texture_range(1), 3);
    assert_eq!(table.next_texture_range(4), 4);
    assert_eq!(table.texture_cursor(), 8);
}

#[test]
fn test_texture_cursor_wraps_modulo_capacity() {
    let mut table = DescriptorTable::new(8).unwrap();

    assert_eq!(table.next_texture_range(6), 0);
    assert_eq!(table.next_texture_range(3), 6);
    // 6 + 3 = 9 wraps to 1
    assert_eq!(table.texture_cursor(), 1);
}

#[test]
fn test_cursors_advance_independently() {
    let mut table = DescriptorTable::new(8).unwrap();

    table.next_constant_slot();
    table.next_constant_slot();
    assert_eq!(table.next_texture_range(2), 0);
    assert_eq!(table.constant_cursor(), 2);
    assert_eq!(table.texture_cursor(), 2);
}
