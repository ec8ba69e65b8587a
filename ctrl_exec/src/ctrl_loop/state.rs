//! Implementations for the CtrlLoop state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use std::collections::HashSet;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use super::*;
use super::plant::Plant;
use crate::idle_mon::IdleMonitor;
use crate::mode_mgr::{
    Fault, ModeMgr, ModeRequest, OperatingMode, RequestOutcome, StatusHandle, TickEval,
    TransitionCause,
};
use eqpt_if::eqpt::act::{ActId, ActuatorBoundary, JointId};
use eqpt_if::eqpt::angle::{AngleSource, LimbSample};
use util::archive::{ArchiveError, Archived, Archiver};
use util::module::State;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const JOINTS: [JointId; 2] = [JointId::Hip, JointId::Knee];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The control loop of the suit.
pub struct CtrlLoop<S: AngleSource, A: ActuatorBoundary> {
    params: CtrlParams,

    mode_mgr: ModeMgr,

    plant: Plant<A>,

    /// One source per limb, in the same order as `plant.limbs`.
    sources: Vec<S>,

    request_sender: Sender<ModeRequest>,
    request_receiver: Receiver<ModeRequest>,

    archiver: Option<Archiver>,

    /// Records of the most recent tick which processed samples.
    records: Vec<TickRecord>,

    stats: LoopStats,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<S: AngleSource, A: ActuatorBoundary> CtrlLoop<S, A> {
    /// Create a new control loop in `Idle`.
    ///
    /// Exactly one source must be given for every configured limb and exactly one actuator for
    /// every driven joint.
    pub fn new(
        params: CtrlParams,
        mut sources: Vec<(LimbId, S)>,
        actuators: Vec<(ActId, A)>,
    ) -> Result<Self, CtrlLoopError> {
        params.validate()?;

        let mut seen = HashSet::new();
        for (id, _) in actuators.iter() {
            let driven = params
                .limb(id.limb)
                .map(|l| l.actuator(id.joint).driven)
                .unwrap_or(false);

            if !driven || !seen.insert(*id) {
                return Err(CtrlLoopError::UnusedActuator(*id));
            }
        }

        let mut limbs = Vec::with_capacity(params.limbs.len());
        let mut ordered_sources = Vec::with_capacity(params.limbs.len());

        for limb_params in params.limbs.iter() {
            let idx = sources
                .iter()
                .position(|(l, _)| *l == limb_params.limb)
                .ok_or(CtrlLoopError::MissingSource(limb_params.limb))?;
            ordered_sources.push(sources.swap_remove(idx).1);

            for joint in JOINTS.iter() {
                let id = ActId::new(limb_params.limb, *joint);
                if limb_params.actuator(*joint).driven && !seen.contains(&id) {
                    return Err(CtrlLoopError::MissingActuator(id));
                }
            }

            limbs.push(LimbCtrl::new(limb_params, &params));
        }

        if let Some((limb, _)) = sources.first() {
            return Err(CtrlLoopError::UnusedSource(*limb));
        }

        let (request_sender, request_receiver) = channel();

        info!(
            "Control loop ready: {} limbs, {} driven actuators, {:.3} s tick",
            limbs.len(),
            actuators.len(),
            params.tick_period_s
        );

        Ok(Self {
            mode_mgr: ModeMgr::new(),
            plant: Plant {
                limbs,
                actuators: ActuatorSet::new(actuators),
                idle_mon: IdleMonitor::new(params.thresholds.idle_timeout_s),
            },
            sources: ordered_sources,
            request_sender,
            request_receiver,
            archiver: None,
            records: Vec::new(),
            stats: LoopStats::default(),
            params,
        })
    }

    /// Run ticks at the configured period until shutdown is requested or a source runs out.
    pub fn run(&mut self) -> LoopExit {
        let period = Duration::from_secs_f64(self.params.tick_period_s);

        loop {
            let tick_start_instant = Instant::now();

            match self.tick() {
                TickOutcome::Shutdown => return LoopExit::Shutdown,
                TickOutcome::SourceExhausted => return LoopExit::SourceExhausted,
                _ => (),
            }

            // ---- TICK MANAGEMENT ----

            let tick_dur = Instant::now() - tick_start_instant;

            match period.checked_sub(tick_dur) {
                Some(d) => thread::sleep(d),
                None => {
                    warn!(
                        "Tick overran by {:.06} s",
                        tick_dur.as_secs_f64() - period.as_secs_f64()
                    );
                    self.stats.num_overruns += 1;
                }
            }
        }
    }

    /// Run a single tick.
    pub fn tick(&mut self) -> TickOutcome {
        self.stats.num_ticks += 1;
        self.records.clear();

        // ---- REQUESTS ----

        let start_mode = self.mode_mgr.mode();

        while let Ok(request) = self.request_receiver.try_recv() {
            if self.mode_mgr.request(request, &mut self.plant) == RequestOutcome::Shutdown {
                return TickOutcome::Shutdown;
            }
        }

        let mode = self.mode_mgr.mode();

        if mode != start_mode {
            return TickOutcome::Transitioned { from: start_mode, to: mode };
        }

        if mode != OperatingMode::Active {
            self.stats.num_suppressed += 1;
            return TickOutcome::Suppressed(mode);
        }

        // ---- ACQUISITION ----

        let mut samples: Vec<LimbSample> = Vec::with_capacity(self.sources.len());

        for (i, source) in self.sources.iter_mut().enumerate() {
            let limb = self.plant.limbs[i].limb();

            match source.next_sample() {
                Ok(Some(sample)) => samples.push(sample),
                Ok(None) => {
                    info!("Angle source for the {:?} limb is exhausted", limb);
                    self.mode_mgr.transition(
                        OperatingMode::Idle,
                        TransitionCause::SourceExhausted,
                        &mut self.plant,
                    );
                    return TickOutcome::SourceExhausted;
                }
                Err(e) => {
                    let fault = Fault::AngleSourceFailed(limb, e.to_string());
                    self.mode_mgr.transition(
                        OperatingMode::Error,
                        TransitionCause::Fault(fault),
                        &mut self.plant,
                    );
                    return TickOutcome::Transitioned { from: mode, to: self.mode_mgr.mode() };
                }
            }
        }

        // ---- ESTIMATION AND DYNAMICS ----

        let mut eval = TickEval::default();
        let mut all_low_effort = true;
        let mut outputs = Vec::with_capacity(samples.len());

        for (limb, sample) in self.plant.limbs.iter_mut().zip(samples.iter()) {
            let (output, report) = match limb.proc(sample) {
                Ok(r) => r,
                Err(e) => match e {},
            };

            if eval.fault.is_none() {
                eval.fault = report.fault;
            }
            all_low_effort &= report.low_effort;
            outputs.push(output);
        }

        let time_s = samples
            .iter()
            .map(|s| s.hip.time_s.max(s.knee.time_s))
            .fold(f64::NEG_INFINITY, f64::max);

        // ---- SUPERVISION ----

        eval.idle_expired = self.plant.idle_mon.update(all_low_effort, time_s);

        let transition = self.mode_mgr.evaluate(&eval, &mut self.plant);
        let end_mode = self.mode_mgr.mode();

        self.records = self
            .plant
            .limbs
            .iter()
            .zip(outputs.iter())
            .map(|(limb, output)| TickRecord::new(time_s, limb.limb(), end_mode, output))
            .collect();

        if let Some((from, to)) = transition {
            self.archive();
            return TickOutcome::Transitioned { from, to };
        }

        // ---- GOVERN AND EMIT ----

        let mut num_commands = 0;

        for ((limb, output), record) in self
            .plant
            .limbs
            .iter_mut()
            .zip(outputs.iter())
            .zip(self.records.iter_mut())
        {
            // A limb is only driven when all of its actuators can take a command
            let mut not_ready = None;
            for joint in JOINTS.iter() {
                let gov = limb.governor(*joint);
                if gov.config().driven && !self.plant.actuators.is_ready(gov.id()) {
                    not_ready = Some(gov.id());
                    break;
                }
            }

            if let Some(id) = not_ready {
                debug!("{} not ready, {:?} limb commands suppressed", id, limb.limb());
            }

            for joint in JOINTS.iter() {
                let gov = limb.governor_mut(*joint);
                if !gov.config().driven {
                    continue;
                }

                let id = gov.id();
                let report = gov.govern(output.torque(*joint).total_nm);

                let emitted = if not_ready.is_some() {
                    false
                }
                else {
                    match self.plant.actuators.emit(id, report.command) {
                        Ok(()) => {
                            gov.commit(report.command);
                            true
                        }
                        Err(e) => {
                            warn!("Could not command {}: {}", id, e);
                            false
                        }
                    }
                };

                if emitted {
                    num_commands += 1;
                }
                record.set_governed(*joint, &report, emitted);
            }
        }

        self.stats.num_commands += num_commands as u64;
        self.archive();

        trace!("Tick at {:.3} s: {} commands emitted", time_s, num_commands);

        TickOutcome::Emitted { num_commands }
    }

    /// Get a handle for requesting mode changes.
    pub fn requester(&self) -> ModeRequester {
        ModeRequester::new(self.request_sender.clone())
    }

    /// Archive every processed tick into the given archiver.
    pub fn attach_archiver(&mut self, archiver: Archiver) {
        self.archiver = Some(archiver);
    }

    /// Get a handle for reading the mode and last fault from another thread.
    pub fn status_handle(&self) -> StatusHandle {
        self.mode_mgr.status_handle()
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode_mgr.mode()
    }

    pub fn last_fault(&self) -> Option<&Fault> {
        self.mode_mgr.last_fault()
    }

    pub fn num_transitions(&self) -> u64 {
        self.mode_mgr.num_transitions()
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn params(&self) -> &CtrlParams {
        &self.params
    }

    /// Records of the last tick which processed samples, one per limb.
    pub fn last_records(&self) -> &[TickRecord] {
        &self.records
    }

    pub fn actuators(&self) -> &ActuatorSet<A> {
        &self.plant.actuators
    }

    /// Write the tick's records, disabling archiving if that fails.
    fn archive(&mut self) {
        if let Err(e) = self.write() {
            warn!("Disabling tick archiving after a write failure: {}", e);
            self.archiver = None;
        }
    }
}

impl<S: AngleSource, A: ActuatorBoundary> Archived for CtrlLoop<S, A> {
    fn write(&mut self) -> Result<(), ArchiveError> {
        if let Some(archiver) = self.archiver.as_mut() {
            for record in self.records.iter() {
                archiver.serialise(record)?;
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use eqpt_if::eqpt::act::{ActuatorError, ActuatorFault};
    use eqpt_if::eqpt::angle::{AngleSourceError, JointSample};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Exactly representable, so sample times compare exactly.
    const DT: f64 = 0.125;

    const RIGHT_HIP: ActId = ActId::new(LimbId::Right, JointId::Hip);
    const RIGHT_KNEE: ActId = ActId::new(LimbId::Right, JointId::Knee);

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum ActCall {
        Enable,
        Command(i16),
        Stop,
    }

    type CallLog = Rc<RefCell<Vec<(ActId, ActCall)>>>;

    type SampleFn = fn(usize) -> Result<Option<LimbSample>, AngleSourceError>;

    struct MockAct {
        id: ActId,
        log: CallLog,
        ready: Rc<Cell<bool>>,
        fail_enable: bool,
    }

    impl ActuatorBoundary for MockAct {
        fn enable(&mut self) -> Result<(), ActuatorError> {
            self.log.borrow_mut().push((self.id, ActCall::Enable));
            if self.fail_enable {
                Err(ActuatorError::Fault(ActuatorFault::UnderVoltage))
            }
            else {
                Ok(())
            }
        }

        fn set_target_command(&mut self, command: i16) -> Result<(), ActuatorError> {
            self.log.borrow_mut().push((self.id, ActCall::Command(command)));
            Ok(())
        }

        fn stop(&mut self) -> Result<(), ActuatorError> {
            self.log.borrow_mut().push((self.id, ActCall::Stop));
            Ok(())
        }

        fn is_ready(&self) -> bool {
            self.ready.get()
        }

        fn fault_status(&self) -> Option<ActuatorFault> {
            None
        }
    }

    /// Source producing the sample for its `k`th pull.
    struct FnSource {
        k: usize,
        f: SampleFn,
    }

    impl AngleSource for FnSource {
        fn next_sample(&mut self) -> Result<Option<LimbSample>, AngleSourceError> {
            let s = (self.f)(self.k);
            self.k += 1;
            s
        }
    }

    struct Harness {
        ctrl: CtrlLoop<FnSource, MockAct>,
        log: CallLog,
        hip_ready: Rc<Cell<bool>>,
        knee_ready: Rc<Cell<bool>>,
    }

    fn sample(hip_deg: f64, knee_deg: f64, k: usize) -> LimbSample {
        let time_s = k as f64 * DT;
        LimbSample {
            hip: JointSample::new(hip_deg.to_radians(), time_s),
            knee: JointSample::new(knee_deg.to_radians(), time_s),
        }
    }

    fn standing(k: usize) -> Result<Option<LimbSample>, AngleSourceError> {
        Ok(Some(sample(0.0, 0.0, k)))
    }

    fn flexed(k: usize) -> Result<Option<LimbSample>, AngleSourceError> {
        Ok(Some(sample(0.0, 60.0, k)))
    }

    /// Right limb only, default thresholds.
    fn right_params() -> CtrlParams {
        let mut params = CtrlParams::default();
        params.limbs.retain(|l| l.limb == LimbId::Right);
        params
    }

    fn harness(params: CtrlParams, f: SampleFn, fail_enable: bool) -> Harness {
        let log = CallLog::default();
        let hip_ready = Rc::new(Cell::new(true));
        let knee_ready = Rc::new(Cell::new(true));

        let acts: Vec<(ActId, MockAct)> = vec![(RIGHT_HIP, &hip_ready), (RIGHT_KNEE, &knee_ready)]
            .into_iter()
            .map(|(id, ready)| {
                (id, MockAct { id, log: log.clone(), ready: ready.clone(), fail_enable })
            })
            .collect();

        let ctrl = CtrlLoop::new(params, vec![(LimbId::Right, FnSource { k: 0, f })], acts)
            .unwrap();

        Harness { ctrl, log, hip_ready, knee_ready }
    }

    fn activate(h: &mut Harness) {
        h.ctrl.requester().request(ModeRequest::Activate).unwrap();
        assert_eq!(
            h.ctrl.tick(),
            TickOutcome::Transitioned { from: OperatingMode::Idle, to: OperatingMode::Active }
        );
    }

    fn commands(log: &CallLog, id: ActId) -> Vec<i16> {
        log.borrow()
            .iter()
            .filter_map(|(i, c)| match c {
                ActCall::Command(cmd) if *i == id => Some(*cmd),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_idle_emits_nothing() {
        let mut h = harness(right_params(), standing, false);

        for _ in 0..5 {
            assert_eq!(h.ctrl.tick(), TickOutcome::Suppressed(OperatingMode::Idle));
        }
        assert!(h.log.borrow().is_empty());
        assert_eq!(h.ctrl.stats().num_suppressed, 5);
    }

    #[test]
    fn test_activate_and_slew() {
        let mut h = harness(right_params(), flexed, false);
        activate(&mut h);

        assert_eq!(
            *h.log.borrow(),
            vec![(RIGHT_HIP, ActCall::Enable), (RIGHT_KNEE, ActCall::Enable)]
        );

        // Gravity on the flexed shank needs about 183 units, reached at 100 per tick
        assert_eq!(h.ctrl.tick(), TickOutcome::Emitted { num_commands: 2 });
        assert_eq!(h.ctrl.tick(), TickOutcome::Emitted { num_commands: 2 });
        assert_eq!(h.ctrl.tick(), TickOutcome::Emitted { num_commands: 2 });

        // The right knee is mounted reversed, the hip is not
        assert_eq!(commands(&h.log, RIGHT_KNEE), vec![100, 183, 183]);
        assert_eq!(commands(&h.log, RIGHT_HIP), vec![-100, -183, -183]);

        let rec = &h.ctrl.last_records()[0];
        assert_eq!(rec.limb, LimbId::Right);
        assert_eq!(rec.mode, OperatingMode::Active);
        assert_eq!(rec.knee_command, Some(183));
        assert!(!rec.knee_slew_limited);
        assert!(rec.knee_gravity_nm < 0.0);
        assert_eq!(rec.knee_torque_nm, rec.knee_gravity_nm);
    }

    #[test]
    fn test_knee_out_of_envelope_trips() {
        fn overflexed(k: usize) -> Result<Option<LimbSample>, AngleSourceError> {
            let knee_deg = if k == 2 { 140.0 } else { 60.0 };
            Ok(Some(sample(0.0, knee_deg, k)))
        }

        let mut h = harness(right_params(), overflexed, false);
        activate(&mut h);
        h.ctrl.tick();
        h.ctrl.tick();
        let num_commands_before = commands(&h.log, RIGHT_KNEE).len();
        h.log.borrow_mut().clear();

        assert_eq!(
            h.ctrl.tick(),
            TickOutcome::Transitioned { from: OperatingMode::Active, to: OperatingMode::Error }
        );

        // Output stopped, nothing commanded on the tripping tick
        assert_eq!(
            *h.log.borrow(),
            vec![(RIGHT_HIP, ActCall::Stop), (RIGHT_KNEE, ActCall::Stop)]
        );
        assert_eq!(num_commands_before, 2);
        assert_eq!(h.ctrl.last_records()[0].knee_command, None);
        assert_eq!(h.ctrl.last_records()[0].mode, OperatingMode::Error);

        match h.ctrl.last_fault() {
            Some(Fault::AngleOutOfEnvelope { act, max_deg, .. }) => {
                assert_eq!(*act, RIGHT_KNEE);
                assert_eq!(*max_deg, 130.0);
            }
            other => panic!("Expected knee angle fault, got {:?}", other),
        }

        // Latched until re-armed
        for _ in 0..3 {
            assert_eq!(h.ctrl.tick(), TickOutcome::Suppressed(OperatingMode::Error));
        }
        assert_eq!(h.log.borrow().len(), 2);

        h.ctrl.requester().request(ModeRequest::Activate).unwrap();
        assert_eq!(
            h.ctrl.tick(),
            TickOutcome::Transitioned { from: OperatingMode::Error, to: OperatingMode::Active }
        );
        assert_eq!(h.ctrl.mode(), OperatingMode::Active);

        // Governor memory starts again from 0, not from the 183 emitted before the trip
        assert_eq!(h.ctrl.tick(), TickOutcome::Emitted { num_commands: 2 });
        assert_eq!(commands(&h.log, RIGHT_KNEE), vec![100]);
        assert_eq!(commands(&h.log, RIGHT_HIP), vec![-100]);
    }

    #[test]
    fn test_idle_timeout() {
        let mut h = harness(right_params(), standing, false);
        activate(&mut h);

        // Timer starts at t = 0 and the timeout is 5 s, so t = 5.125 s is the first expiry
        let mut num_emitted = 0;
        loop {
            match h.ctrl.tick() {
                TickOutcome::Emitted { .. } => num_emitted += 1,
                TickOutcome::Transitioned { from, to } => {
                    assert_eq!(from, OperatingMode::Active);
                    assert_eq!(to, OperatingMode::Idle);
                    break;
                }
                other => panic!("Unexpected outcome {:?}", other),
            }
        }
        assert_eq!(num_emitted, 41);
        assert_eq!(h.ctrl.last_fault(), None);
    }

    #[test]
    fn test_effort_restarts_idle_timer() {
        // One flexed sample just before the timeout would expire
        fn twitch(k: usize) -> Result<Option<LimbSample>, AngleSourceError> {
            let knee_deg = if k == 39 { 60.0 } else { 0.0 };
            Ok(Some(sample(0.0, knee_deg, k)))
        }

        let mut h = harness(right_params(), twitch, false);
        activate(&mut h);

        let mut k = 0;
        loop {
            let outcome = h.ctrl.tick();
            if let TickOutcome::Transitioned { to, .. } = outcome {
                assert_eq!(to, OperatingMode::Idle);
                break;
            }
            assert_eq!(outcome, TickOutcome::Emitted { num_commands: 2 });
            k += 1;
            assert!(k < 100, "Never went idle");
        }

        // Still active at 2 * timeout - eps
        assert!(k as f64 * DT > 2.0 * 5.0 - DT);
    }

    #[test]
    fn test_not_ready_suppresses_without_commit() {
        let mut h = harness(right_params(), flexed, false);
        activate(&mut h);

        h.hip_ready.set(false);
        h.knee_ready.set(false);
        assert_eq!(h.ctrl.tick(), TickOutcome::Emitted { num_commands: 0 });
        assert_eq!(h.ctrl.last_records()[0].knee_command, None);

        h.hip_ready.set(true);
        h.knee_ready.set(true);
        assert_eq!(h.ctrl.tick(), TickOutcome::Emitted { num_commands: 2 });

        // Slew measured from the last emitted command, not the suppressed one
        assert_eq!(commands(&h.log, RIGHT_KNEE), vec![100]);
    }

    #[test]
    fn test_one_not_ready_suppresses_limb() {
        let mut h = harness(right_params(), flexed, false);
        activate(&mut h);

        h.knee_ready.set(false);
        assert_eq!(h.ctrl.tick(), TickOutcome::Emitted { num_commands: 0 });
        assert!(commands(&h.log, RIGHT_HIP).is_empty());
        assert!(commands(&h.log, RIGHT_KNEE).is_empty());

        let rec = &h.ctrl.last_records()[0];
        assert_eq!(rec.hip_command, None);
        assert_eq!(rec.knee_command, None);

        h.knee_ready.set(true);
        assert_eq!(h.ctrl.tick(), TickOutcome::Emitted { num_commands: 2 });
        assert_eq!(commands(&h.log, RIGHT_HIP), vec![-100]);
        assert_eq!(commands(&h.log, RIGHT_KNEE), vec![100]);
    }

    #[test]
    fn test_enable_failure_trips() {
        let mut h = harness(right_params(), standing, true);
        h.ctrl.requester().request(ModeRequest::Activate).unwrap();

        assert_eq!(
            h.ctrl.tick(),
            TickOutcome::Transitioned { from: OperatingMode::Idle, to: OperatingMode::Error }
        );
        match h.ctrl.last_fault() {
            Some(Fault::ActuatorEnableFailed(id, _)) => assert_eq!(*id, RIGHT_HIP),
            other => panic!("Expected enable fault, got {:?}", other),
        }
        assert!(commands(&h.log, RIGHT_HIP).is_empty());
        assert_eq!(h.ctrl.tick(), TickOutcome::Suppressed(OperatingMode::Error));
    }

    #[test]
    fn test_source_failure_and_exhaustion() {
        fn failing(k: usize) -> Result<Option<LimbSample>, AngleSourceError> {
            if k < 2 { standing(k) } else { Err(AngleSourceError::Disconnected) }
        }
        fn finite(k: usize) -> Result<Option<LimbSample>, AngleSourceError> {
            if k < 3 { standing(k) } else { Ok(None) }
        }

        let mut h = harness(right_params(), failing, false);
        activate(&mut h);
        h.ctrl.tick();
        h.ctrl.tick();
        assert_eq!(
            h.ctrl.tick(),
            TickOutcome::Transitioned { from: OperatingMode::Active, to: OperatingMode::Error }
        );
        assert!(matches!(h.ctrl.last_fault(), Some(Fault::AngleSourceFailed(LimbId::Right, _))));

        let mut h = harness(right_params(), finite, false);
        activate(&mut h);
        for _ in 0..3 {
            assert_eq!(h.ctrl.tick(), TickOutcome::Emitted { num_commands: 2 });
        }
        assert_eq!(h.ctrl.tick(), TickOutcome::SourceExhausted);
        assert_eq!(h.ctrl.mode(), OperatingMode::Idle);
    }

    #[test]
    fn test_shutdown_stops_actuators() {
        let mut h = harness(right_params(), flexed, false);
        activate(&mut h);
        h.ctrl.tick();
        h.log.borrow_mut().clear();

        h.ctrl.requester().request(ModeRequest::Shutdown).unwrap();
        assert_eq!(h.ctrl.tick(), TickOutcome::Shutdown);
        assert_eq!(h.ctrl.mode(), OperatingMode::Idle);
        assert_eq!(
            *h.log.borrow(),
            vec![(RIGHT_HIP, ActCall::Stop), (RIGHT_KNEE, ActCall::Stop)]
        );

        // Dropping the loop stops them again
        let log = h.log.clone();
        drop(h);
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn test_run_until_exhausted() {
        fn finite(k: usize) -> Result<Option<LimbSample>, AngleSourceError> {
            if k < 5 { flexed(k) } else { Ok(None) }
        }

        let mut params = right_params();
        params.tick_period_s = 0.002;
        params.min_sample_interval_s = 0.001;

        let mut h = harness(params, finite, false);
        let requester = h.ctrl.requester();
        requester.request(ModeRequest::Activate).unwrap();

        assert_eq!(h.ctrl.run(), LoopExit::SourceExhausted);
        assert_eq!(h.ctrl.stats().num_ticks, 7);
        assert_eq!(h.ctrl.stats().num_commands, 10);

        drop(h);
        assert!(requester.request(ModeRequest::Idle).is_err());
    }

    #[test]
    fn test_status_readable_while_running() {
        let mut params = right_params();
        params.tick_period_s = 0.002;
        params.min_sample_interval_s = 0.001;

        let mut h = harness(params, flexed, false);
        let status = h.ctrl.status_handle();
        let requester = h.ctrl.requester();
        requester.request(ModeRequest::Activate).unwrap();

        // Watch from another thread while the loop owns the controller
        let watcher = thread::spawn(move || {
            let mut seen = None;
            for _ in 0..5000 {
                let s = status.get().unwrap();
                if s.mode == OperatingMode::Active {
                    seen = Some(s);
                    break;
                }
                thread::sleep(Duration::from_millis(1));
            }
            requester.request(ModeRequest::Shutdown).unwrap();
            seen
        });

        assert_eq!(h.ctrl.run(), LoopExit::Shutdown);

        let seen = watcher.join().unwrap().expect("Active never observed");
        assert_eq!(seen.last_fault, None);
        assert_eq!(seen.num_transitions, 1);

        let after = h.ctrl.status_handle().get().unwrap();
        assert_eq!(after.mode, OperatingMode::Idle);
        assert_eq!(after.num_transitions, 2);
    }

    #[test]
    fn test_shutdown_handler_stops_loop() {
        let mut h = harness(right_params(), flexed, false);
        activate(&mut h);
        h.ctrl.tick();
        h.log.borrow_mut().clear();

        let mut on_interrupt = h.ctrl.requester().shutdown_handler();
        on_interrupt();

        assert_eq!(h.ctrl.tick(), TickOutcome::Shutdown);
        assert_eq!(
            *h.log.borrow(),
            vec![(RIGHT_HIP, ActCall::Stop), (RIGHT_KNEE, ActCall::Stop)]
        );

        // A second signal after the loop is gone is harmless
        drop(h);
        on_interrupt();
    }

    #[test]
    fn test_archive_rows() {
        let path = std::env::temp_dir()
            .join(format!("exo_ctrl_loop_test_{}", std::process::id()))
            .join("tick_records.csv");

        let mut h = harness(right_params(), flexed, false);
        h.ctrl.attach_archiver(Archiver::from_abs_path(&path).unwrap());
        activate(&mut h);
        h.ctrl.tick();
        h.ctrl.tick();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("time_s,limb,mode,hip_angle_rad"));
        assert!(lines[1].contains(",Right,Active,"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_new_checks_wiring() {
        let log = CallLog::default();
        let ready = Rc::new(Cell::new(true));
        let act = |id: ActId| {
            (id, MockAct { id, log: log.clone(), ready: ready.clone(), fail_enable: false })
        };
        let src = || FnSource { k: 0, f: standing };

        let no_sources: Vec<(LimbId, FnSource)> = Vec::new();
        match CtrlLoop::new(right_params(), no_sources, vec![act(RIGHT_HIP), act(RIGHT_KNEE)]) {
            Err(CtrlLoopError::MissingSource(LimbId::Right)) => (),
            other => panic!("Expected missing source, got {:?}", other.err()),
        }

        match CtrlLoop::new(right_params(), vec![(LimbId::Right, src())], vec![act(RIGHT_HIP)]) {
            Err(CtrlLoopError::MissingActuator(id)) => assert_eq!(id, RIGHT_KNEE),
            other => panic!("Expected missing actuator, got {:?}", other.err()),
        }

        let left_hip = ActId::new(LimbId::Left, JointId::Hip);
        match CtrlLoop::new(
            right_params(),
            vec![(LimbId::Right, src())],
            vec![act(RIGHT_HIP), act(RIGHT_KNEE), act(left_hip)],
        ) {
            Err(CtrlLoopError::UnusedActuator(id)) => assert_eq!(id, left_hip),
            other => panic!("Expected unused actuator, got {:?}", other.err()),
        }

        // An undriven joint needs no actuator but is still supervised
        let mut params = right_params();
        params.limbs[0].hip.driven = false;
        let ctrl = CtrlLoop::new(params, vec![(LimbId::Right, src())], vec![act(RIGHT_KNEE)]);
        assert!(ctrl.is_ok());
    }
}
