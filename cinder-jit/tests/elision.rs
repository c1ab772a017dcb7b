use cinder_jit::prelude::*;

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
fn repeated_constant_load_collapses_to_the_last() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_num(Opcode::Mov, Reg::Eax, 5);
    emitter.emit_reg_num(Opcode::Mov, Reg::Eax, 5);
    emitter.emit_reg_num(Opcode::Mov, Reg::Eax, 7);

    // The duplicate was never appended; the first became a dead store.
    assert_eq!(2, emitter.instructions().len());
    assert_eq!(2, emitter.optimization_count());

    let kept = kept(&emitter);

    assert_eq!(
        vec![Instruction::new(
            Opcode::Mov,
            Operand::Reg(Reg::Eax),
            Operand::Num(7)
        )],
        kept
    );
}

#[test]
fn identical_imm64_reload_is_skipped() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_imm64(Opcode::Mov64, Reg::Esi, 0xdead_beef_0000_0001);
    emitter.emit_reg_imm64(Opcode::Mov64, Reg::Esi, 0xdead_beef_0000_0001);

    assert_eq!(1, emitter.instructions().len());
    assert_eq!(1, emitter.optimization_count());
}

#[test]
fn self_assignment_emits_nothing() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_reg(Opcode::Mov, Reg::Eax, Reg::Eax);

    assert!(emitter.instructions().is_empty());
    assert_eq!(1, emitter.optimization_count());
}

#[test]
fn redirected_self_assignment_emits_nothing() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_reg(Opcode::Mov, Reg::Ebx, Reg::Eax);
    // ebx mirrors eax, so copying it back is a no-op.
    emitter.emit_reg_reg(Opcode::Mov, Reg::Eax, Reg::Ebx);

    assert_eq!(1, kept(&emitter).len());
    assert_eq!(1, emitter.optimization_count());
}

#[test]
fn load_cse_reuses_the_first_destination() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_mem(Opcode::Mov, Reg::Eax, frame(-4));
    emitter.emit_reg_mem(Opcode::Mov, Reg::Ebx, frame(-4));

    let kept = kept(&emitter);

    assert_eq!(2, kept.len());
    assert_eq!(
        Instruction::new(Opcode::Mov, Operand::Reg(Reg::Ebx), Operand::Reg(Reg::Eax)),
        kept[1]
    );
}

#[test]
fn repeated_load_into_the_same_register_is_elided() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_mem(Opcode::Mov, Reg::Eax, frame(-4));
    emitter.emit_reg_mem(Opcode::Mov, Reg::Eax, frame(-4));

    assert_eq!(1, emitter.instructions().len());
    assert_eq!(1, emitter.optimization_count());
}

#[test]
fn store_forwards_to_a_following_load() {
    let mut emitter = Emitter::new();

    emitter.emit_mem_reg(Opcode::Mov, frame(-8), Reg::Ecx);
    emitter.emit_reg_mem(Opcode::Mov, Reg::Edx, frame(-8));

    let kept = kept(&emitter);

    assert_eq!(2, kept.len());
    assert_eq!(
        Instruction::new(Opcode::Mov, Operand::Reg(Reg::Edx), Operand::Reg(Reg::Ecx)),
        kept[1]
    );
}

#[test]
fn aliasing_store_invalidates_an_earlier_load() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_mem(Opcode::Mov, Reg::Eax, frame(-4));
    emitter.emit_mem_reg(Opcode::Mov, frame(-4), Reg::Ebx);
    emitter.emit_reg_mem(Opcode::Mov, Reg::Ecx, frame(-4));

    let kept = kept(&emitter);

    assert_eq!(3, kept.len());

    // The stale pre-store register must not be forwarded; the value now
    // comes from the store's source.
    assert_ne!(Operand::Reg(Reg::Eax), kept[2].b);
    assert_eq!(
        Instruction::new(Opcode::Mov, Operand::Reg(Reg::Ecx), Operand::Reg(Reg::Ebx)),
        kept[2]
    );
}

#[test]
fn disjoint_store_keeps_load_cse_alive() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_mem(Opcode::Mov, Reg::Eax, frame(-4));
    emitter.emit_mem_reg(Opcode::Mov, frame(-8), Reg::Ebx);
    emitter.emit_reg_mem(Opcode::Mov, Reg::Ecx, frame(-4));

    let kept = kept(&emitter);

    assert_eq!(3, kept.len());
    assert_eq!(
        Instruction::new(Opcode::Mov, Operand::Reg(Reg::Ecx), Operand::Reg(Reg::Eax)),
        kept[2]
    );
}

#[test]
fn call_discards_every_known_value() {
    let mut emitter = Emitter::new();

    emitter.emit_label(0, false);
    emitter.emit_reg_num(Opcode::Mov, Reg::Eax, 5);
    // The constant escapes into the call as an argument.
    emitter.read_register(Reg::Eax);
    emitter.emit_jump(Opcode::Call, 0, false, false);

    assert!(emitter.known_reg(Reg::Eax).is_none());

    emitter.emit_reg_reg(Opcode::Mov, Reg::Ebx, Reg::Eax);

    let kept = kept(&emitter);

    assert_eq!(4, kept.len());

    // No constant substitution: the call may have clobbered eax.
    assert_eq!(
        Instruction::new(Opcode::Mov, Operand::Reg(Reg::Ebx), Operand::Reg(Reg::Eax)),
        kept[3]
    );
}

#[test]
fn unread_value_is_a_dead_store() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_num(Opcode::Mov, Reg::Eax, 1);
    emitter.emit_reg_num(Opcode::Mov, Reg::Eax, 2);

    let kept = kept(&emitter);

    assert_eq!(1, kept.len());
    assert_eq!(Operand::Num(2), kept[0].b);
    assert_eq!(1, emitter.optimization_count());
}

#[test]
fn an_intervening_read_protects_the_store() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_num(Opcode::Mov, Reg::Eax, 1);
    emitter.emit_reg_reg(Opcode::Cmp, Reg::Eax, Reg::Ebx);
    emitter.emit_reg_num(Opcode::Mov, Reg::Eax, 2);

    assert_eq!(3, kept(&emitter).len());
    assert_eq!(0, emitter.optimization_count());
}

#[test]
fn load_then_store_roundtrip_tracks_both_directions() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_mem(Opcode::Mov, Reg::Eax, frame(-4));

    assert_eq!(Operand::Ptr(frame(-4)), emitter.known_reg(Reg::Eax));

    emitter.emit_mem_reg(Opcode::Mov, frame(-4), Reg::Eax);

    assert_eq!(2, kept(&emitter).len());
    assert_eq!(
        Some(Operand::Reg(Reg::Eax)),
        emitter.cached_value(&frame(-4))
    );
    assert_eq!(Operand::Ptr(frame(-4)), emitter.known_reg(Reg::Eax));
}

#[test]
fn early_kill_recovers_a_dead_store() {
    let mut emitter = Emitter::new();

    emitter.emit_reg_num(Opcode::Mov, Reg::Edi, 12);
    emitter.kill_register(Reg::Edi);

    assert!(emitter.instructions()[0].is_deleted());
    assert!(emitter.known_reg(Reg::Edi).is_none());
}
