use cinder_jit::prelude::*;

use rstest::rstest;

fn kept(emitter: &Emitter) -> Vec<Instruction> {
    emitter
        .instructions()
        .iter()
        .copied()
        .filter(|record| !record.is_deleted() && !record.is_comment())
        .collect()
}

fn frame(disp: i32) -> Ptr {
    Ptr::new(Size::Dword, Reg::Ebp, disp)
}

#[test]
fn constant_base_folds_into_the_displacement() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_num(Opcode::Mov, Reg::Eax, 7);
    emitter.emit_mem_reg(Opcode::Mov, Ptr::new(Size::Dword, Reg::Eax, 4), Reg::Ebx);

    let kept = kept(&emitter);

    assert_eq!(Operand::Ptr(Ptr::absolute(Size::Dword, 11)), kept[1].a);
}

#[test]
fn copied_base_register_is_replaced_by_its_source() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_reg(Opcode::Mov, Reg::Eax, Reg::Esi);
    emitter.emit_mem_reg(Opcode::Mov, Ptr::new(Size::Dword, Reg::Eax, 0), Reg::Ebx);

    let kept = kept(&emitter);

    assert_eq!(Operand::Ptr(Ptr::new(Size::Dword, Reg::Esi, 0)), kept[1].a);
}

#[test]
fn constant_index_folds_scaled_into_the_displacement() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_num(Opcode::Mov, Reg::Ecx, 3);
    emitter.emit_reg_mem(
        Opcode::Mov,
        Reg::Eax,
        Ptr::sib(Size::Dword, Reg::Ecx, 4, Reg::Ebp, 8),
    );

    let kept = kept(&emitter);

    assert_eq!(Operand::Ptr(frame(20)), kept[1].b);
    assert!(emitter.known_reg(Reg::Eax) == Operand::Ptr(frame(20)));
}

#[test]
fn add_from_a_known_constant_uses_the_immediate_form() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_num(Opcode::Mov, Reg::Ebx, 5);
    emitter.emit_reg_reg(Opcode::Add, Reg::Eax, Reg::Ebx);

    let kept = kept(&emitter);

    assert_eq!(
        Instruction::new(Opcode::Add, Operand::Reg(Reg::Eax), Operand::Num(5)),
        kept[1]
    );
}

#[test]
fn multiplying_two_known_constants_loads_the_product() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_num(Opcode::Mov, Reg::Eax, 6);
    emitter.emit_reg_num(Opcode::Mov, Reg::Ebx, 7);
    emitter.emit_reg_reg(Opcode::Imul, Reg::Eax, Reg::Ebx);

    let kept = kept(&emitter);

    // The first constant load of eax turned into a dead store.
    assert_eq!(2, kept.len());
    assert_eq!(
        Instruction::new(Opcode::Mov, Operand::Reg(Reg::Eax), Operand::Num(42)),
        kept[1]
    );
}

#[test]
fn and_from_a_memory_mirror_uses_the_memory_form() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_mem(Opcode::Mov, Reg::Ebx, frame(-4));
    emitter.emit_reg_reg(Opcode::And, Reg::Eax, Reg::Ebx);

    let kept = kept(&emitter);

    assert_eq!(
        Instruction::new(Opcode::And, Operand::Reg(Reg::Eax), Operand::Ptr(frame(-4))),
        kept[1]
    );
}

#[test]
fn storing_a_known_constant_uses_the_immediate_store() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_num(Opcode::Mov, Reg::Ecx, 9);
    emitter.emit_mem_reg(Opcode::Mov, frame(-4), Reg::Ecx);

    let kept = kept(&emitter);

    assert_eq!(
        Instruction::new(Opcode::Mov, Operand::Ptr(frame(-4)), Operand::Num(9)),
        kept[1]
    );
    assert_eq!(Some(Operand::Num(9)), emitter.cached_value(&frame(-4)));
}

#[test]
fn qword_store_of_a_known_constant_is_not_narrowed() {
    let mut emitter = Emitter::new();

    let slot = Ptr::new(Size::Qword, Reg::Ebp, -16);

    emitter.emit_reg_num(Opcode::Mov, Reg::Ecx, 9);
    emitter.emit_mem_reg(Opcode::Mov64, slot, Reg::Ecx);

    let kept = kept(&emitter);

    assert_eq!(Operand::Reg(Reg::Ecx), kept[1].b);
}

#[test]
fn xmm_load_cse_reuses_the_first_destination() {
    let mut emitter = Emitter::new();

    let slot = Ptr::new(Size::Qword, Reg::Ebp, -16);

    emitter.emit_xmm_mem(Opcode::Movsd, XmmReg::Xmm0, slot);
    emitter.emit_xmm_mem(Opcode::Movsd, XmmReg::Xmm1, slot);

    let kept = kept(&emitter);

    assert_eq!(
        Instruction::new(Opcode::Movsd, Operand::Xmm(XmmReg::Xmm1), Operand::Xmm(XmmReg::Xmm0)),
        kept[1]
    );
}

#[test]
fn xmm_store_forwards_to_a_following_load() {
    let mut emitter = Emitter::new();

    let slot = Ptr::new(Size::Qword, Reg::Ebp, -24);

    emitter.emit_mem_xmm(Opcode::Movsd, slot, XmmReg::Xmm2);
    emitter.emit_xmm_mem(Opcode::Movsd, XmmReg::Xmm3, slot);

    let kept = kept(&emitter);

    assert_eq!(
        Instruction::new(Opcode::Movsd, Operand::Xmm(XmmReg::Xmm3), Operand::Xmm(XmmReg::Xmm2)),
        kept[1]
    );
}

#[test]
fn xmm_self_assignment_emits_nothing() {
    let mut emitter = Emitter::new();

    emitter.emit_xmm_xmm(Opcode::Movsd, XmmReg::Xmm4, XmmReg::Xmm5);
    // xmm4 mirrors xmm5; copying back is a no-op.
    emitter.emit_xmm_xmm(Opcode::Movsd, XmmReg::Xmm5, XmmReg::Xmm4);

    assert_eq!(1, emitter.instructions().len());
    assert_eq!(1, emitter.optimization_count());
}

#[test]
fn conversions_leave_the_destination_unknown() {
    let mut emitter = Emitter::new();

    emitter.emit_xmm_mem(Opcode::Cvtsi2sd, XmmReg::Xmm0, frame(-4));

    assert!(emitter.known_xmm(XmmReg::Xmm0).is_none());

    // The conversion result does not mirror the source slot; a later load
    // must still read memory.
    emitter.emit_xmm_mem(Opcode::Movsd, XmmReg::Xmm1, Ptr::new(Size::Qword, Reg::Ebp, -4));

    let kept = kept(&emitter);

    assert!(matches!(kept[1].b, Operand::Ptr(_)));
}

#[rstest]
#[case(Opcode::Addsd)]
#[case(Opcode::Subsd)]
#[case(Opcode::Mulsd)]
#[case(Opcode::Divsd)]
#[case(Opcode::Cmpeqsd)]
#[case(Opcode::Cmpltsd)]
#[case(Opcode::Cmplesd)]
#[case(Opcode::Cmpneqsd)]
fn scalar_dyadic_family_redirects_its_source(#[case] op: Opcode) {
    let mut emitter = Emitter::new();

    emitter.emit_xmm_xmm(Opcode::Movsd, XmmReg::Xmm1, XmmReg::Xmm0);
    emitter.emit_xmm_xmm(op, XmmReg::Xmm2, XmmReg::Xmm1);

    let kept = kept(&emitter);

    assert_eq!(
        Instruction::new(op, Operand::Xmm(XmmReg::Xmm2), Operand::Xmm(XmmReg::Xmm0)),
        kept[1]
    );
}

#[test]
fn shift_count_register_is_never_redirected() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_reg(Opcode::Mov, Reg::Ecx, Reg::Esi);
    emitter.emit_reg_reg(Opcode::Sal, Reg::Eax, Reg::Ecx);

    let kept = kept(&emitter);

    // The count stays architecturally pinned to ecx.
    assert_eq!(Operand::Reg(Reg::Ecx), kept[1].b);
}
