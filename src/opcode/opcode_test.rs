use super::*;

#[test]
fn abc_round_trips() {
    let word = encode_abc(op::MOVE, 0x1a3, 0x0ff, 0x2a);
    assert_eq!(opcode(word), op::MOVE);
    assert_eq!(a(word), 0x1a3);
    assert_eq!(b(word), 0x0ff);
    assert_eq!(c(word), 0x2a);
}

#[test]
fn abx_round_trips() {
    let word = encode_abx(op::LOADI, 5, 0xBEEF);
    assert_eq!(opcode(word), op::LOADI);
    assert_eq!(a(word), 5);
    assert_eq!(bx(word), 0xBEEF);
}

#[test]
fn sbx_recovers_signed_displacement() {
    let forward = encode_abx(op::JMP, 0, (SBX_BIAS + 10) as u32);
    assert_eq!(sbx(forward), 10);

    let backward = encode_abx(op::JMP, 0, (SBX_BIAS - 10) as u32);
    assert_eq!(sbx(backward), -10);
}

#[test]
fn ax_round_trips() {
    let word = encode_ax(op::EXEC, 0x01AB_CDEF & 0x1ff_ffff);
    assert_eq!(opcode(word), op::EXEC);
    assert_eq!(ax(word), 0x01AB_CDEF & 0x1ff_ffff);
}

#[test]
fn fields_do_not_bleed_into_each_other() {
    let word = encode_abc(op::ADD, 0x1ff, 0, 0);
    assert_eq!(b(word), 0);
    assert_eq!(c(word), 0);

    let word = encode_abc(op::ADD, 0, 0x1ff, 0);
    assert_eq!(a(word), 0);
    assert_eq!(c(word), 0);
}
