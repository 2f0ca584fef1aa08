// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Invisible jigsaw chains, alone and nested inside a combinatoric search.

mod common;

use common::{assert_close, jet, wz_jets};
use jigsaw_reco::jigsaw::{ContraBoostInvJigsaw, MinMassesCombJigsaw, SetMassInvJigsaw, SetRapidityInvJigsaw};
use jigsaw_reco::{
    AnalysisConfig, AnalysisContext, Counters, FourVector, FrameId, FrameKind, GroupId, GroupKind, Jigsaw, JigsawId,
    ResolveFailure, ThreeVector,
};

/// LAB → CM → {Wa, Wb}; Wa → {La, Na}; Wb → {Lb, Nb}. The leptons are
/// measured directly, the neutrinos share the missing momentum.
struct Dilepton {
    ctx: AnalysisContext,
    inv: GroupId,
    set_rapidity: JigsawId,
    cm: FrameId,
    wa: FrameId,
    wb: FrameId,
    la: FrameId,
    lb: FrameId,
    na: FrameId,
    nb: FrameId,
}

impl Dilepton {
    fn new(neutrino_mass: f64) -> Self {
        let mut ctx = AnalysisContext::new(AnalysisConfig::default());
        let lab = ctx.add_frame("LAB", FrameKind::Lab);
        let cm = ctx.add_frame("CM", FrameKind::Decay);
        let wa = ctx.add_frame("Wa", FrameKind::Decay);
        let wb = ctx.add_frame("Wb", FrameKind::Decay);
        let la = ctx.add_frame("La", FrameKind::Visible);
        let na = ctx.add_frame("Na", FrameKind::Invisible);
        let lb = ctx.add_frame("Lb", FrameKind::Visible);
        let nb = ctx.add_frame("Nb", FrameKind::Invisible);
        ctx.set_child(lab, cm).unwrap();
        ctx.set_child(cm, wa).unwrap();
        ctx.set_child(cm, wb).unwrap();
        ctx.set_child(wa, la).unwrap();
        ctx.set_child(wa, na).unwrap();
        ctx.set_child(wb, lb).unwrap();
        ctx.set_child(wb, nb).unwrap();
        ctx.set_invisible_mass(na, neutrino_mass).unwrap();
        ctx.set_invisible_mass(nb, neutrino_mass).unwrap();

        let inv = ctx.add_group("INV", GroupKind::Invisible);
        ctx.add_frame_to_group(inv, na).unwrap();
        ctx.add_frame_to_group(inv, nb).unwrap();

        let set_mass = ctx.add_jigsaw(inv, SetMassInvJigsaw::new("SetMass")).unwrap();
        ctx.add_jigsaw_frames(set_mass, &[na, nb], 0).unwrap();
        let set_rapidity = ctx.add_jigsaw(inv, SetRapidityInvJigsaw::new("SetRapidity")).unwrap();
        ctx.add_jigsaw_frame(set_rapidity, cm, 0).unwrap();
        let contra_boost = ctx.add_jigsaw(inv, ContraBoostInvJigsaw::new("ContraBoost")).unwrap();
        ctx.add_jigsaw_frame(contra_boost, wa, 0).unwrap();
        ctx.add_jigsaw_frame(contra_boost, wb, 1).unwrap();
        ctx.initialize_analysis().unwrap();

        Self {
            ctx,
            inv,
            set_rapidity,
            cm,
            wa,
            wb,
            la,
            lb,
            na,
            nb,
        }
    }

    fn analyze(&mut self, la: FourVector, lb: FourVector, met: ThreeVector) -> Result<(), ResolveFailure> {
        self.ctx.clear_event();
        self.ctx.set_frame_four_vector(self.la, la).unwrap();
        self.ctx.set_frame_four_vector(self.lb, lb).unwrap();
        self.ctx.set_invisible_momentum(self.inv, met).unwrap();
        self.ctx.analyze_event()
    }

    fn invisible(&self) -> FourVector {
        self.ctx.frame_four_vector(self.na).unwrap() + self.ctx.frame_four_vector(self.nb).unwrap()
    }
}

fn leptons() -> (FourVector, FourVector, ThreeVector) {
    (
        jet(30.0, 10.0, 20.0),
        jet(-25.0, 15.0, -40.0),
        ThreeVector::new(5.0, -20.0, 0.0),
    )
}

#[test]
fn test_invisible_system_keeps_missing_momentum() {
    let mut ww = Dilepton::new(0.0);
    let (la, lb, met) = leptons();
    ww.analyze(la, lb, met).unwrap();

    let invisible = ww.invisible();
    assert_close(invisible.px, met.x, 1e-9);
    assert_close(invisible.py, met.y, 1e-9);
    assert_close(invisible.m(), 0.0, 1e-6);
}

#[test]
fn test_invisible_rapidity_follows_visible() {
    let mut ww = Dilepton::new(0.0);
    let (la, lb, met) = leptons();
    ww.analyze(la, lb, met).unwrap();

    let expected = (la + lb).rapidity().unwrap();
    assert_close(ww.invisible().rapidity().unwrap(), expected, 1e-9);
}

#[test]
fn test_invisible_mass_is_sum_of_frame_masses() {
    let mut ww = Dilepton::new(10.0);
    let (la, lb, met) = leptons();
    ww.analyze(la, lb, met).unwrap();

    let invisible = ww.invisible();
    assert_close(invisible.m(), 20.0, 1e-6);
    assert_close(invisible.px, met.x, 1e-9);
}

#[test]
fn test_split_preserves_invisible_system() {
    let mut ww = Dilepton::new(0.0);
    let (la, lb, met) = leptons();
    ww.analyze(la, lb, met).unwrap();

    let core = ww.ctx.jigsaw(ww.set_rapidity).unwrap().core();
    let before = ww.ctx.state(core.child_state(0)).unwrap().four_vector();
    let after = ww.invisible();
    assert_close(after.e, before.e, 1e-9);
    assert_close(after.px, before.px, 1e-9);
    assert_close(after.py, before.py, 1e-9);
    assert_close(after.pz, before.pz, 1e-9);
}

#[test]
fn test_parents_balance_in_rest_frame() {
    let mut ww = Dilepton::new(0.0);
    let (la, lb, met) = leptons();
    ww.analyze(la, lb, met).unwrap();

    let a = ww.ctx.frame_four_vector_in(ww.wa, ww.cm).unwrap();
    let b = ww.ctx.frame_four_vector_in(ww.wb, ww.cm).unwrap();
    assert_close(a.e, b.e, 1e-9);
    let sum = a.vect() + b.vect();
    assert!(sum.mag() < 1e-9, "parents not back-to-back: {:?}", sum);
    let cm = ww.ctx.frame_four_vector_in(ww.cm, ww.cm).unwrap();
    assert!(cm.vect().mag() < 1e-9);
}

#[test]
fn test_missing_invisible_momentum_fails() {
    let mut ww = Dilepton::new(0.0);
    let (la, lb, _) = leptons();
    ww.ctx.clear_event();
    ww.ctx.set_frame_four_vector(ww.la, la).unwrap();
    ww.ctx.set_frame_four_vector(ww.lb, lb).unwrap();
    assert!(matches!(
        ww.ctx.analyze_event(),
        Err(ResolveFailure::MissingInput { .. })
    ));
    assert!(ww.ctx.frame_four_vector(ww.na).is_err());
}

#[test]
fn test_missing_lepton_fails() {
    let mut ww = Dilepton::new(0.0);
    let (la, _, met) = leptons();
    ww.ctx.clear_event();
    ww.ctx.set_frame_four_vector(ww.la, la).unwrap();
    ww.ctx.set_invisible_momentum(ww.inv, met).unwrap();
    assert!(matches!(
        ww.ctx.analyze_event(),
        Err(ResolveFailure::MissingInput { source_name }) if source_name == "Lb"
    ));
}

/// LAB → CM → {A, B}; A → {Va, Ia}; B → {Vb, Ib}. Jets are split between
/// Va and Vb by a search that scores each split after resolving the
/// invisible frames for it.
struct Nested {
    ctx: AnalysisContext,
    jets: GroupId,
    inv: GroupId,
    split: JigsawId,
    chain: [JigsawId; 3],
    a: FrameId,
    b: FrameId,
    va: FrameId,
    vb: FrameId,
}

fn nested() -> Nested {
    let mut ctx = AnalysisContext::default();
    let lab = ctx.add_frame("LAB", FrameKind::Lab);
    let cm = ctx.add_frame("CM", FrameKind::Decay);
    let a = ctx.add_frame("A", FrameKind::Decay);
    let b = ctx.add_frame("B", FrameKind::Decay);
    let va = ctx.add_frame("Va", FrameKind::Visible);
    let ia = ctx.add_frame("Ia", FrameKind::Invisible);
    let vb = ctx.add_frame("Vb", FrameKind::Visible);
    let ib = ctx.add_frame("Ib", FrameKind::Invisible);
    ctx.set_child(lab, cm).unwrap();
    ctx.set_child(cm, a).unwrap();
    ctx.set_child(cm, b).unwrap();
    ctx.set_child(a, va).unwrap();
    ctx.set_child(a, ia).unwrap();
    ctx.set_child(b, vb).unwrap();
    ctx.set_child(b, ib).unwrap();

    let jets = ctx.add_group("JETS", GroupKind::Combinatoric);
    ctx.add_frame_to_group(jets, va).unwrap();
    ctx.add_frame_to_group(jets, vb).unwrap();
    let inv = ctx.add_group("INV", GroupKind::Invisible);
    ctx.add_frame_to_group(inv, ia).unwrap();
    ctx.add_frame_to_group(inv, ib).unwrap();

    let split = ctx.add_jigsaw(jets, MinMassesCombJigsaw::new("MinM")).unwrap();
    ctx.add_jigsaw_frame(split, a, 0).unwrap();
    ctx.add_jigsaw_frame(split, b, 1).unwrap();
    let set_mass = ctx.add_jigsaw(inv, SetMassInvJigsaw::new("SetMass")).unwrap();
    ctx.add_jigsaw_frames(set_mass, &[ia, ib], 0).unwrap();
    let set_rapidity = ctx.add_jigsaw(inv, SetRapidityInvJigsaw::new("SetRapidity")).unwrap();
    ctx.add_jigsaw_frame(set_rapidity, cm, 0).unwrap();
    let contra_boost = ctx.add_jigsaw(inv, ContraBoostInvJigsaw::new("ContraBoost")).unwrap();
    ctx.add_jigsaw_frame(contra_boost, a, 0).unwrap();
    ctx.add_jigsaw_frame(contra_boost, b, 1).unwrap();
    ctx.initialize_analysis().unwrap();

    Nested {
        ctx,
        jets,
        inv,
        split,
        chain: [set_mass, set_rapidity, contra_boost],
        a,
        b,
        va,
        vb,
    }
}

#[test]
fn test_search_inlines_invisible_chain() {
    let nested = nested();
    let ctx = &nested.ctx;
    let [set_mass, set_rapidity, contra_boost] = nested.chain;

    let split = ctx.jigsaw(nested.split).unwrap();
    assert_eq!(split.core().inline_jigsaws().as_slice(), &[set_mass, set_rapidity, contra_boost]);
    assert_eq!(ctx.execution_list().first(), Some(nested.split));
    assert!(ctx.depends_on(contra_boost, nested.split));
    assert!(!ctx.depends_on(nested.split, contra_boost));
    for id in nested.chain {
        assert!(ctx.jigsaw(id).unwrap().core().inline_jigsaws().is_empty());
    }
}

#[test]
fn test_search_scores_every_split_with_invisibles() {
    let mut nested = nested();
    nested.ctx.clear_event();
    for p in wz_jets() {
        nested.ctx.add_input(nested.jets, p).unwrap();
    }
    let met = ThreeVector::new(10.0, -5.0, 0.0);
    nested.ctx.set_invisible_momentum(nested.inv, met).unwrap();
    nested.ctx.analyze_event().unwrap();

    let stats = nested.ctx.statistics();
    assert_eq!(stats.get(Counters::FastPathPartitions), 0);
    assert_eq!(stats.get(Counters::ExhaustivePartitions), 1);
    assert_eq!(stats.get(Counters::CandidatesEvaluated), 14);

    let cm_a = nested.ctx.frame_four_vector(nested.a).unwrap();
    let cm_b = nested.ctx.frame_four_vector(nested.b).unwrap();
    let jets: FourVector = wz_jets().iter().sum();
    let total = cm_a + cm_b;
    assert_close(total.px, jets.px + met.x, 1e-9);
    assert_close(total.py, jets.py + met.y, 1e-9);
    assert!(nested.ctx.frame_mass(nested.va).unwrap() <= nested.ctx.frame_mass(nested.vb).unwrap());
}

#[test]
fn test_failed_search_leaves_children_unchanged() {
    let mut nested = nested();
    nested.ctx.clear_event();
    for p in wz_jets() {
        nested.ctx.add_input(nested.jets, p).unwrap();
    }
    nested.ctx.set_invisible_momentum(nested.inv, ThreeVector::new(10.0, -5.0, 0.0)).unwrap();
    nested.ctx.analyze_event().unwrap();

    // same jets, but nothing for the invisible chain to split
    nested.ctx.clear_event();
    for p in wz_jets() {
        nested.ctx.add_input(nested.jets, p).unwrap();
    }
    assert_eq!(
        nested.ctx.analyze_event(),
        Err(ResolveFailure::NoValidPartition { jigsaw: "MinM".into() })
    );

    let ctx = &nested.ctx;
    let mut written = ctx.jigsaw(nested.split).unwrap().core().child_states().to_vec();
    for id in nested.chain {
        written.extend(ctx.jigsaw(id).unwrap().core().child_states());
    }
    for state in written {
        assert!(ctx.state(state).unwrap().is_empty(), "state {} kept a candidate", state);
    }
    assert!(ctx.frame_four_vector(nested.va).is_err());
}
