//! The transition engine: one handler per event kind.
//!
//! Every handler follows the same five-step pattern:
//!
//! 1. Update the counters and the person's state tag.
//! 2. Recompute the candidate instants it cares about, from the person's
//!    attributes, the clock, and the model distributions.
//! 3. Cancel the person's queue entry where one is still pending.
//! 4. Pick the earliest candidate, point `pending` at it, and schedule it.
//! 5. Return which candidate won.
//!
//! Each handler's tie-break priority among simultaneous candidates is fixed
//! and noted where the comparisons happen. Handlers that remove a person
//! (death, emigration) leave no queue entry and compact the register.
//!
//! Candidate instants must be strictly future; draws that can return zero
//! get an epsilon added. Candidates that must never fire are placed a
//! couple of run-lengths past the horizon rather than flagged, so every
//! comparison below stays a plain numeric one.

use epi_core::{fatal, PersonId};
use epi_model::{age_class, Route};
use epi_pop::{Cohort, Pending, Sex, Slot, State, Subcohort};

use crate::sim::{Simulation, EPSILON};

impl Simulation {
    // ── Small shared steps ────────────────────────────────────────────────

    /// Point `pending` at the winning candidate and enter it in the queue.
    fn schedule_pending(&mut self, id: PersonId, pending: Pending, te: f64) -> Pending {
        self.register.person_mut(id).pending = pending;
        self.queue.schedule(id, te);
        pending
    }

    /// Move a live person between compartments, counters included.
    fn force_state(&mut self, id: PersonId, to: State) {
        let from = self.register.person(id).state;
        self.counts.transition(from, to);
        self.register.person_mut(id).state = to;
    }

    // ── Birth ─────────────────────────────────────────────────────────────

    /// Create a native-born newborn at instant `b`. Newborns are
    /// Uninfected; they leave that state by vaccination, by infection, or
    /// by death or emigration. Priority on ties: vaccination, emigration,
    /// death.
    pub(crate) fn birth(&mut self, b: f64) -> Pending {
        let now = self.queue.now();
        let y = self.year();
        let id = self.register.allocate(Cohort::Native);
        self.births_total += 1;

        let sex = if self.rng.rand() < self.data.male_birth_fraction(y) {
            Sex::Male
        } else {
            Sex::Female
        };

        let wd = self.draw_death(sex, now - b);
        let we = b + {
            let rate = self.params.emigration[sex.index()][Cohort::Native.index()];
            self.emigration.years_until(&mut self.rng, rate)
        };

        let person = self.register.person_mut(id);
        *person = Default::default();
        person.sex = sex;
        person.cohort = Cohort::Native;
        person.subcohort = Subcohort::Baseline;
        person.set_time(Slot::Birth, b);
        person.set_time(Slot::Death, wd);
        person.set_time(Slot::Emigrate, we);
        self.counts.enter(State::Uninfected);

        // Vaccination lands somewhere within the programme's target year,
        // while the programme is still running.
        let ci = Cohort::Native.index();
        let wv = b + self.params.vaccine_age[ci] + self.rng.rand();
        let vaccinated = b < self.params.vaccine_end_year
            && self.rng.rand()
                < self.params.vaccine_efficacy[ci] * self.params.vaccine_coverage[ci]
            && wv < wd
            && wv < we;

        if vaccinated {
            return self.schedule_pending(id, Pending::Vaccinate, wv);
        }
        if we < wd {
            return self.schedule_pending(id, Pending::Emigrate, we);
        }
        self.schedule_pending(id, Pending::Death, wd)
    }

    // ── Immigration ───────────────────────────────────────────────────────

    /// Initialise a newly arrived person in slot `id` (already allocated to
    /// its cohort). All demographic and infection attributes are drawn
    /// fresh — the slot may be recycled from someone who left.
    pub(crate) fn immigrate(&mut self, id: PersonId) -> Pending {
        let now = self.queue.now();
        let y = self.year();
        let cohort = self.register.cohort_of_slot(id);
        self.immigrations_total += 1;

        {
            let person = self.register.person_mut(id);
            *person = Default::default();
            person.cohort = cohort;
        }
        self.counts.enter(State::Uninfected);

        // Subcohort and sex from the year's arrival mix.
        let mut subcohort = Subcohort::Baseline;
        let mut sex = Sex::Male;
        if cohort == Cohort::Foreign {
            if self.rng.rand() < self.data.high_incidence_fraction(y) {
                subcohort = Subcohort::HighIncidence;
                if self.rng.rand() > self.data.immigrant_male_fraction(y, 2) {
                    sex = Sex::Female;
                }
                if self.rng.rand() < self.data.coinfection_prevalence(sex, y) {
                    subcohort = Subcohort::Coinfected;
                }
            } else if self.rng.rand() > self.data.immigrant_male_fraction(y, 0) {
                sex = Sex::Female;
            }
        } else if self.rng.rand() > self.data.immigrant_male_fraction(y, cohort.index()) {
            sex = Sex::Female;
        }
        {
            let person = self.register.person_mut(id);
            person.sex = sex;
            person.subcohort = subcohort;
        }

        let group = self.register.person(id).origin_group();
        let age = self.data.immigrant_age(&mut self.rng, y, sex, group);
        let a = age as usize;

        let wd = self.draw_death(sex, age);
        let we = self.draw_emigration(sex, group);

        // Catch-up vaccination for arrivals under the target age, while the
        // programme window is open.
        let ci = cohort.index();
        let target_age = self.params.vaccine_age[ci];
        let wv = if age < target_age
            && self.rng.rand()
                < self.params.vaccine_efficacy[ci] * self.params.vaccine_coverage[ci]
            && now < self.params.vaccine_catchup_end - (target_age - age)
        {
            now + (target_age - age) + self.rng.rand()
        } else {
            now + self.data.far_future(&mut self.rng)
        };

        {
            let person = self.register.person_mut(id);
            person.set_time(Slot::Birth, now - age);
            person.set_time(Slot::Death, wd);
            person.set_time(Slot::Emigrate, we);
        }
        if wd < now {
            fatal(612, &format!("death precedes arrival (wd={wd}, t={now})"));
        }

        // Priority on ties: vaccination, death, emigration.
        let scheduled = if wv < wd && wv < we {
            self.schedule_pending(id, Pending::Vaccinate, wv)
        } else if wd < we {
            self.register.person_mut(id).set_time(Slot::Exit, wd);
            self.schedule_pending(id, Pending::Death, wd)
        } else {
            self.register.person_mut(id).set_time(Slot::Exit, we);
            self.schedule_pending(id, Pending::Emigrate, we)
        };

        // Entry state: the arrival may bring an infection history with it,
        // in which case the record is routed through the matching handler.
        match self.data.immigrant_entry_state(&mut self.rng, a, group, y) {
            0 => scheduled,
            1 => {
                self.queue.cancel(id);
                self.vaccinate(id)
            }
            2 => {
                let since = self.rng.rand() * 5.0;
                self.infect(id, since).expect("uninfected arrivals are susceptible")
            }
            3 => {
                // Pass through a disease compartment so the remote handler
                // refreshes the mutation candidate.
                self.queue.cancel(id);
                self.force_state(id, State::PrimaryDisease);
                self.to_remote(id)
            }
            4 => {
                self.force_state(id, State::RemoteInfection);
                let since = self.rng.rand() * 5.0;
                self.infect(id, since).expect("remote arrivals are reinfectable")
            }
            k @ 5..=7 => {
                self.queue.cancel(id);
                let source = [State::RecentInfection, State::RemoteInfection, State::Reinfection];
                self.force_state(id, source[k - 5]);
                self.disease(id)
            }
            k => fatal(618, &format!("entry state out of range ({k})")),
        }
    }

    // ── Vaccination ───────────────────────────────────────────────────────

    /// Effective vaccination (wasted doses are never scheduled). Immunity
    /// is lifelong: the only exits are emigration and death, emigration
    /// winning ties.
    pub(crate) fn vaccinate(&mut self, id: PersonId) -> Pending {
        self.force_state(id, State::Immune);
        let p = *self.register.person(id);
        if p.time(Slot::Emigrate) < p.time(Slot::Death) {
            self.schedule_pending(id, Pending::Emigrate, p.time(Slot::Emigrate))
        } else {
            self.schedule_pending(id, Pending::Death, p.time(Slot::Death))
        }
    }

    // ── Infection (target side) ───────────────────────────────────────────

    /// Infect person `id`, whose infection happened `since` years ago
    /// (0 for a fresh contact, up to the latency window for histories
    /// brought in at entry). Returns `None` when the target is not
    /// susceptible — the contact is then simply lost.
    ///
    /// Priority on ties: death, emigration, to-remote, mutation, disease.
    pub(crate) fn infect(&mut self, id: PersonId, since: f64) -> Option<Pending> {
        let now = self.queue.now();
        let p = *self.register.person(id);

        let new_state = match p.state {
            State::Uninfected => State::RecentInfection,
            State::RemoteInfection => State::Reinfection,
            _ => return None,
        };

        if !(0.0..=self.params.latency_years).contains(&since) {
            fatal(617, &format!("time since infection out of range ({since})"));
        }
        let since = if since == self.params.latency_years {
            since - EPSILON
        } else {
            since
        };

        self.queue.cancel(id);
        self.force_state(id, new_state);

        let wd = p.time(Slot::Death);
        let we = p.time(Slot::Emigrate);
        let wr = now + self.params.latency_years - since;

        let route = if new_state == State::RecentInfection {
            Route::Recent
        } else {
            Route::Reinfection
        };
        let wdis = now
            + self.data.time_to_disease(
                &mut self.rng,
                route,
                p.sex,
                p.risk_group(),
                p.age(now),
                since,
            )
            + EPSILON;
        if wdis <= now {
            fatal(620, &format!("disease onset not in the future (t={now}, wdis={wdis})"));
        }
        let wm = now + self.rng.expon(self.params.mutation_infected);

        if wd < we && wd < wr && wd < wdis && wd < wm {
            return Some(self.schedule_pending(id, Pending::Death, wd));
        }
        if we < wr && we < wdis && we < wm {
            return Some(self.schedule_pending(id, Pending::Emigrate, we));
        }
        if wr < wdis && wr < wm {
            let person = self.register.person_mut(id);
            person.set_time(Slot::Exit, wr);
            person.set_time(Slot::Mutate, wm);
            return Some(self.schedule_pending(id, Pending::ToRemote, wr));
        }
        if wm < wdis {
            let person = self.register.person_mut(id);
            person.set_time(Slot::Disease, wdis);
            person.set_time(Slot::Exit, wr);
            person.set_time(Slot::Mutate, wm);
            return Some(self.schedule_pending(id, Pending::Mutate, wm));
        }
        // The other candidates are recomputed at onset; only the winner is
        // kept.
        self.register.person_mut(id).set_time(Slot::Disease, wdis);
        Some(self.schedule_pending(id, Pending::Disease, wdis))
    }

    // ── To remote infection ───────────────────────────────────────────────

    /// Enter the remote-infection compartment, from a recent
    /// (re)infection running its course or from a disease compartment on
    /// recovery. Reinfection from here is driven by transmission events,
    /// not by this handler. Priority on ties: death, mutation, emigration,
    /// disease.
    pub(crate) fn to_remote(&mut self, id: PersonId) -> Pending {
        let now = self.queue.now();
        let prev = self.register.person(id).state;
        self.force_state(id, State::RemoteInfection);

        if prev.is_disease() {
            // The strain clock was running at the diseased rate; re-draw it
            // at the infected rate.
            let wm = now + self.rng.expon(self.params.mutation_infected);
            self.register.person_mut(id).set_time(Slot::Mutate, wm);
        }

        let p = *self.register.person(id);
        let wdis = now
            + self.data.time_to_disease(
                &mut self.rng,
                Route::Remote,
                p.sex,
                p.risk_group(),
                p.age(now),
                0.0,
            );
        self.register.person_mut(id).set_time(Slot::Disease, wdis);

        let wd = p.time(Slot::Death);
        let we = p.time(Slot::Emigrate);
        let wm = self.register.person(id).time(Slot::Mutate);

        if wd < wdis && wd < wm && wd < we {
            return self.schedule_pending(id, Pending::Death, wd);
        }
        if wm < wdis && wm < we {
            return self.schedule_pending(id, Pending::Mutate, wm);
        }
        if we < wdis {
            return self.schedule_pending(id, Pending::Emigrate, we);
        }
        self.schedule_pending(id, Pending::Disease, wdis)
    }

    // ── Disease onset ─────────────────────────────────────────────────────

    /// Progress to active disease. The source compartment picks the
    /// disease compartment (recent→primary, remote→reactivation,
    /// reinfection→reinfection disease), a pulmonary draw picks the site,
    /// and every candidate of the diseased life is established: recovery,
    /// mutation, possibly an advanced death for fatal cases, a notification
    /// instant, and onward transmission for smear-positive pulmonary
    /// cases. Priority on ties: transmission, report, recovery, mutation,
    /// emigration, death.
    pub(crate) fn disease(&mut self, id: PersonId) -> Pending {
        let now = self.queue.now();
        let y = self.year();
        let p = *self.register.person(id);
        let age = p.age(now);
        let a = age as usize;
        let s = p.sex.index();

        let (route, pulm_state, nonpulm_state) = match p.state {
            State::RecentInfection => (0usize, State::PrimaryDisease, State::PrimaryNonPulm),
            State::RemoteInfection => (1, State::ReactivationDisease, State::ReactivationNonPulm),
            State::Reinfection => (2, State::ReinfectionDisease, State::ReinfectionNonPulm),
            other => fatal(922, &format!("disease onset from {other}")),
        };

        let p_pulm = self.params.pulmonary_fraction[s][p.cohort.index()];
        let (rate_idx, new_state, pulmonary) = if self.rng.rand() > p_pulm {
            (route + 3, nonpulm_state, false)
        } else {
            (route, pulm_state, true)
        };
        self.force_state(id, new_state);

        let mut wr = now
            + self
                .recovery
                .years_until(&mut self.rng, self.params.recovery[rate_idx][s]);
        self.register.person_mut(id).set_time(Slot::Exit, wr);
        let we = p.time(Slot::Emigrate);
        let mut wd = p.time(Slot::Death);
        let wm = now + self.rng.expon(self.params.mutation_diseased);
        self.register.person_mut(id).set_time(Slot::Mutate, wm);

        // Fatal cases die shortly before whichever exit would otherwise end
        // the disease episode (the original model's policy, kept as is).
        if self.rng.rand() < self.data.case_fatality(a, pulmonary, y) {
            let e = if wr < wd && wr < we {
                wr
            } else if wd < we {
                wd
            } else {
                we
            };
            wd = now + 0.99 * (e - now);
            self.register.person_mut(id).set_time(Slot::Death, wd);
        }

        // Notification at a uniform instant within the episode, or never.
        let wrep = if self.rng.rand() < self.params.report_fraction {
            let e = if wr < wd && wr < we {
                wr
            } else if wd < we {
                wd
            } else {
                we
            };
            now + self.rng.rand() * (e - now)
        } else {
            now + self.data.far_future(&mut self.rng)
        };
        if wrep == 0.0 {
            fatal(619, &format!("notification instant is zero ({id})"));
        }
        self.register.person_mut(id).set_time(Slot::Report, wrep);

        // An advanced death takes precedence over recovery.
        if wd < wr {
            wr = wd;
        }

        let wt = if pulmonary && self.rng.rand() < self.data.smear_positive(a) {
            now + self.rng.expon(self.params.contacts[s][p.cohort.index()])
        } else {
            now + self.data.far_future(&mut self.rng)
        };
        self.register.person_mut(id).set_time(Slot::Transmit, wt);

        if wt < wr && wt < wm && wt < we && wt < wrep {
            return self.schedule_pending(id, Pending::Transmit, wt);
        }
        if wrep < wr && wrep < wm && wrep < we {
            return self.schedule_pending(id, Pending::Report, wrep);
        }
        if wr < wd && wr < wm && wr < we {
            return self.schedule_pending(id, Pending::ToRemote, wr);
        }
        if wm < wd && wm < we {
            return self.schedule_pending(id, Pending::Mutate, wm);
        }
        if we < wd {
            return self.schedule_pending(id, Pending::Emigrate, we);
        }
        self.schedule_pending(id, Pending::Death, wd)
    }

    // ── Transmission (source side) ────────────────────────────────────────

    /// An infectious case transmits: pick a target — a close contact from
    /// the source's own cohort with probability `pcc`, else anyone in the
    /// live population — infect them, and re-arm the source. The cursor
    /// ranges make the uniform pick a direct index draw with no occupancy
    /// scan. The source's next event is the first minimum over its
    /// candidates in the order transmission, death, emigration, recovery,
    /// mutation, report.
    pub(crate) fn transmit(&mut self, id: PersonId) -> Pending {
        let p = *self.register.person(id);

        let target = if self.rng.rand() < self.params.pcc {
            let range = self.register.cohort_range(p.cohort);
            let low = range.start;
            let tot = range.len() as u32;
            if tot <= 1 {
                None // nobody in the cohort but the source
            } else {
                loop {
                    let i = low + (self.rng.rand() * tot as f64) as u32;
                    if i != id.0 {
                        break Some(PersonId(i));
                    }
                }
            }
        } else {
            let nf = self.register.foreign_range().len() as u32;
            let nn = self.register.native_range().len() as u32;
            let tot = nf + nn;
            let native_base = self.register.native_range().start;
            if tot <= 1 {
                None
            } else {
                loop {
                    let j = 1 + (self.rng.rand() * tot as f64) as u32;
                    let i = if j > nf { native_base + (j - nf - 1) } else { j };
                    if i != id.0 {
                        break Some(PersonId(i));
                    }
                }
            }
        };

        if let Some(target) = target {
            self.infect(target, 0.0);
        }

        let now = self.queue.now();
        let wt = now + self.rng.expon(self.params.contacts[p.sex.index()][p.cohort.index()]);
        self.register.person_mut(id).set_time(Slot::Transmit, wt);

        // First strict minimum wins, in this fixed candidate order.
        const ORDER: [(Slot, Pending); 6] = [
            (Slot::Transmit, Pending::Transmit),
            (Slot::Death, Pending::Death),
            (Slot::Emigrate, Pending::Emigrate),
            (Slot::Exit, Pending::ToRemote),
            (Slot::Mutate, Pending::Mutate),
            (Slot::Report, Pending::Report),
        ];
        let p = *self.register.person(id);
        let mut best = ORDER[0];
        let mut x = f64::INFINITY;
        for entry in ORDER {
            let w = p.time(entry.0);
            if w < x {
                x = w;
                best = entry;
            }
        }
        self.schedule_pending(id, best.1, x)
    }

    // ── Strain mutation ───────────────────────────────────────────────────

    /// The strain of an infected or diseased person mutates. No other
    /// candidate is affected; the next mutation is re-drawn at the rate of
    /// the current compartment and the earliest candidate rescheduled.
    pub(crate) fn mutate(&mut self, id: PersonId) -> Pending {
        let now = self.queue.now();
        let p = *self.register.person(id);

        let rate = if p.state.is_disease() {
            self.params.mutation_diseased
        } else {
            self.params.mutation_infected
        };
        let wm = now + self.rng.expon(rate);
        self.register.person_mut(id).set_time(Slot::Mutate, wm);

        let wd = p.time(Slot::Death);
        let we = p.time(Slot::Emigrate);
        let wdis = p.time(Slot::Disease);
        let wr = p.time(Slot::Exit);

        if p.state == State::RemoteInfection {
            // Priority: death, mutation, disease, emigration.
            if wd < we && wd < wdis && wd < wm {
                return self.schedule_pending(id, Pending::Death, wd);
            }
            if wm < we && wm < wdis {
                return self.schedule_pending(id, Pending::Mutate, wm);
            }
            if wdis < we {
                return self.schedule_pending(id, Pending::Disease, wdis);
            }
            return self.schedule_pending(id, Pending::Emigrate, we);
        }

        if p.state.is_latent() {
            // Recent infection and reinfection.
            // Priority: death, to-remote, mutation, disease, emigration.
            if wd < wdis && wd < wr && wd < wm && wd < we {
                return self.schedule_pending(id, Pending::Death, wd);
            }
            if wr < wdis && wr < wm && wr < we {
                return self.schedule_pending(id, Pending::ToRemote, wr);
            }
            if wm < wdis && wm < we {
                return self.schedule_pending(id, Pending::Mutate, wm);
            }
            if wdis < we {
                return self.schedule_pending(id, Pending::Disease, wdis);
            }
            return self.schedule_pending(id, Pending::Emigrate, we);
        }

        if p.state.is_disease() {
            // Priority: transmission, report, recovery, mutation, death,
            // emigration.
            let wrep = p.time(Slot::Report);
            if p.state.is_pulmonary_disease() {
                let wt = p.time(Slot::Transmit);
                if wt < wd && wt < wr && wt < wm && wt < we && wt < wrep {
                    return self.schedule_pending(id, Pending::Transmit, wt);
                }
            }
            if wrep < wd && wrep < wr && wrep < wm && wrep < we {
                return self.schedule_pending(id, Pending::Report, wrep);
            }
            if wr < wd && wr < wm && wr < we {
                return self.schedule_pending(id, Pending::ToRemote, wr);
            }
            if wm < wd && wm < we {
                return self.schedule_pending(id, Pending::Mutate, wm);
            }
            if wd < we {
                return self.schedule_pending(id, Pending::Death, wd);
            }
            return self.schedule_pending(id, Pending::Emigrate, we);
        }

        fatal(922, &format!("mutation dispatched for {} in state {}", id, p.state));
    }

    // ── Death ─────────────────────────────────────────────────────────────

    /// The person dies: tallies, age moments, and slot compaction. The
    /// dispatched entry was already consumed, so the freed slot holds no
    /// queue entry.
    pub(crate) fn death(&mut self, id: PersonId) {
        let now = self.queue.now();
        let p = *self.register.person(id);

        self.deaths_since_report += 1;
        self.deaths_total += 1;
        self.counts.leave(p.state);

        let age = p.age(now);
        self.age_sum += age;
        self.age_sq_sum += age * age;
        self.age_n += 1.0;

        self.register.free(id, &mut self.queue);
    }

    // ── Emigration ────────────────────────────────────────────────────────

    /// The person leaves the study population; the slot is recycled the
    /// same way as at death.
    pub(crate) fn emigrate(&mut self, id: PersonId) {
        let state = self.register.person(id).state;
        self.counts.leave(state);
        self.emigrations_total += 1;
        self.register.free(id, &mut self.queue);
    }

    // ── Case report ───────────────────────────────────────────────────────

    /// Notify the case: accumulate the (age class, sex, origin, site,
    /// year) cell, push the report candidate past the horizon so it cannot
    /// fire twice, and reschedule the earliest remaining candidate.
    /// Priority on ties: transmission, recovery, mutation, emigration,
    /// death.
    pub(crate) fn report_case(&mut self, id: PersonId) -> Pending {
        let now = self.queue.now();
        let y = self.year();
        let p = *self.register.person(id);

        let acl = age_class(p.age(now));
        let s = p.sex.index();
        let r = p.origin_group();
        let site = p.state.is_pulmonary_disease() as usize;
        let cell = self.notifications.get(&[acl, s, r, site, y]) + 1.0;
        self.notifications.set(&[acl, s, r, site, y], cell);

        let never = self.params.t1 * 2.0 + self.rng.rand();
        self.register.person_mut(id).set_time(Slot::Report, never);

        let wd = p.time(Slot::Death);
        let we = p.time(Slot::Emigrate);
        let wr = p.time(Slot::Exit);
        let wm = p.time(Slot::Mutate);

        if p.state.is_pulmonary_disease() {
            let wt = p.time(Slot::Transmit);
            if wt < wd && wt < we && wt < wr && wt < wm {
                return self.schedule_pending(id, Pending::Transmit, wt);
            }
        }
        if wr < wd && wr < we && wr < wm {
            return self.schedule_pending(id, Pending::ToRemote, wr);
        }
        if wm < wd && wm < we {
            return self.schedule_pending(id, Pending::Mutate, wm);
        }
        if we < wd {
            return self.schedule_pending(id, Pending::Emigrate, we);
        }
        self.schedule_pending(id, Pending::Death, wd)
    }

    // ── Initial-population setup ──────────────────────────────────────────

    /// Give a just-allocated member of the starting population their first
    /// event: vaccination (if the target age is still ahead), emigration,
    /// or death. The caller has set birth time, sex, cohort, and subcohort.
    pub(crate) fn setup_initial_person(&mut self, id: PersonId) {
        let now = self.queue.now();
        let p = *self.register.person(id);
        let age = p.age(now);
        let ci = p.cohort.index();

        self.counts.enter(State::Uninfected);

        let wd = self.draw_death(p.sex, age);
        let we = now + {
            let rate = self.params.emigration[p.sex.index()][ci];
            self.emigration.years_until(&mut self.rng, rate)
        };

        let target_age = self.params.vaccine_age[ci];
        let wv = if age < target_age
            && self.rng.rand()
                < self.params.vaccine_efficacy[ci] * self.params.vaccine_coverage[ci]
        {
            now + (target_age - age) + self.rng.rand()
        } else {
            now + self.data.far_future(&mut self.rng)
        };

        {
            let person = self.register.person_mut(id);
            person.set_time(Slot::Death, wd);
            person.set_time(Slot::Emigrate, we);
        }

        if wv < wd && wv < we {
            self.schedule_pending(id, Pending::Vaccinate, wv);
        } else if wd < we {
            self.register.person_mut(id).set_time(Slot::Exit, wd);
            self.schedule_pending(id, Pending::Death, wd);
        } else {
            self.register.person_mut(id).set_time(Slot::Exit, we);
            self.schedule_pending(id, Pending::Emigrate, we);
        }
    }

    /// Draw the entry state for a member of the starting population and
    /// route the record through the matching handler, exactly as for an
    /// immigrant arrival.
    pub(crate) fn assign_initial_state(&mut self, id: PersonId, age: usize) {
        let p = *self.register.person(id);
        let group = p.origin_group();

        match self.data.initial_entry_state(&mut self.rng, age, p.sex, group) {
            0 => {}
            1 => {
                self.queue.cancel(id);
                self.vaccinate(id);
            }
            2 => {
                let since = self.rng.rand() * 5.0;
                self.infect(id, since);
            }
            3 => {
                self.queue.cancel(id);
                self.force_state(id, State::PrimaryDisease);
                self.to_remote(id);
            }
            4 => {
                self.force_state(id, State::RemoteInfection);
                let since = self.rng.rand() * 5.0;
                self.infect(id, since);
            }
            k @ 5..=7 => {
                self.queue.cancel(id);
                let source = [State::RecentInfection, State::RemoteInfection, State::Reinfection];
                self.force_state(id, source[k - 5]);
                self.disease(id);
            }
            k => fatal(618, &format!("entry state out of range ({k})")),
        }
    }
}
