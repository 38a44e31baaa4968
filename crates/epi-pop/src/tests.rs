//! Unit tests for epi-pop.

use epi_core::PersonId;
use epi_schedule::EventQueue;

use crate::person::{Cohort, Slot, State};
use crate::register::Register;
use crate::counters::StateCounts;

fn queue_for(reg: &Register) -> EventQueue {
    let mut q = EventQueue::new(reg.max_person(), 64, 20.0);
    q.start_time(0.0);
    q
}

// ── Register ──────────────────────────────────────────────────────────────────

mod register {
    use super::*;

    #[test]
    fn layout_reserves_pseudo_slots() {
        let reg = Register::new(10, 4);
        assert_eq!(reg.birth_generator(), PersonId(11));
        assert_eq!(reg.immigration_generator(), PersonId(12));
        assert_eq!(reg.max_person(), 12);
        assert_eq!(reg.foreign_range(), 1..1);
        assert_eq!(reg.native_range(), 5..5);
    }

    #[test]
    fn allocate_advances_cursors() {
        let mut reg = Register::new(10, 4);
        assert_eq!(reg.allocate(Cohort::Foreign), PersonId(1));
        assert_eq!(reg.allocate(Cohort::Foreign), PersonId(2));
        assert_eq!(reg.allocate(Cohort::Native), PersonId(5));
        assert_eq!(reg.foreign_range(), 1..3);
        assert_eq!(reg.native_range(), 5..6);
        assert_eq!(reg.live_count(), 3);
    }

    #[test]
    fn cohort_of_slot_follows_ranges() {
        let reg = Register::new(10, 4);
        assert_eq!(reg.cohort_of_slot(PersonId(4)), Cohort::Foreign);
        assert_eq!(reg.cohort_of_slot(PersonId(5)), Cohort::Native);
    }

    /// Freeing a middle slot copies the highest record down and moves its
    /// queue entry; the range stays gap-free.
    #[test]
    fn free_compacts_and_renumbers() {
        let mut reg = Register::new(10, 4);
        let mut q = queue_for(&reg);

        for i in 0..3 {
            let id = reg.allocate(Cohort::Foreign);
            reg.person_mut(id).set_time(Slot::Death, 5.0 + i as f64);
            q.schedule(id, 5.0 + i as f64);
        }

        // Person 1's event dispatched; its slot is released.
        q.cancel(PersonId(1));
        reg.free(PersonId(1), &mut q);

        assert_eq!(reg.foreign_range(), 1..3);
        // Slot 1 now holds what was person 3.
        assert_eq!(reg.person(PersonId(1)).time(Slot::Death), 7.0);
        assert!(q.is_scheduled(PersonId(1)));
        assert!(!q.is_scheduled(PersonId(3)));
        assert_eq!(q.scheduled_time(PersonId(1)), Some(7.0));
    }

    /// Freeing the highest slot is a pure cursor retreat.
    #[test]
    fn free_highest_slot_moves_nothing() {
        let mut reg = Register::new(10, 4);
        let mut q = queue_for(&reg);
        let a = reg.allocate(Cohort::Native);
        let b = reg.allocate(Cohort::Native);
        q.schedule(a, 1.0);
        q.schedule(b, 2.0);

        q.cancel(b);
        reg.free(b, &mut q);
        assert_eq!(reg.native_range(), 5..6);
        assert!(q.is_scheduled(a));
    }

    #[test]
    fn ranges_stay_gap_free_under_churn() {
        let mut reg = Register::new(200, 100);
        let mut q = queue_for(&reg);
        let mut rng = epi_core::Lcg::new(77);

        let mut live: Vec<PersonId> = Vec::new();
        for step in 0..2_000 {
            if rng.rand() < 0.6 || live.is_empty() {
                let cohort = if rng.rand() < 0.5 { Cohort::Foreign } else { Cohort::Native };
                if reg.cohort_range(cohort).len() < 100 {
                    let id = reg.allocate(cohort);
                    q.schedule(id, q.now() + 1.0 + rng.rand());
                    live.push(id);
                }
            } else {
                let k = (rng.rand() * live.len() as f64) as usize;
                let id = live.swap_remove(k);
                q.cancel(id);
                reg.free(id, &mut q);
                // The donor slot disappeared; retarget any stale handle.
                let donor = PersonId(match reg.cohort_of_slot(id) {
                    Cohort::Foreign => reg.foreign_range().end,
                    Cohort::Native => reg.native_range().end,
                });
                for h in live.iter_mut() {
                    if *h == donor {
                        *h = id;
                    }
                }
            }

            if step % 100 == 0 {
                // Every live slot is scheduled; every id in a live range is live.
                for id in reg.live_ids() {
                    assert!(q.is_scheduled(id), "gap at {id}");
                }
                assert_eq!(q.len(), reg.live_count() as usize);
            }
        }
    }

    #[test]
    #[should_panic(expected = "E911")]
    fn allocate_past_capacity_is_fatal() {
        let mut reg = Register::new(4, 2);
        reg.allocate(Cohort::Foreign);
        reg.allocate(Cohort::Foreign);
        reg.allocate(Cohort::Foreign);
    }
}

// ── Counters ──────────────────────────────────────────────────────────────────

mod counters {
    use super::*;

    #[test]
    fn enter_transition_leave() {
        let mut n = StateCounts::new();
        n.enter(State::Uninfected);
        n.enter(State::Uninfected);
        n.transition(State::Uninfected, State::RecentInfection);
        assert_eq!(n.get(State::Uninfected), 1);
        assert_eq!(n.get(State::RecentInfection), 1);
        assert_eq!(n.total(), 2);
        n.leave(State::RecentInfection);
        assert_eq!(n.total(), 1);
    }

    #[test]
    #[should_panic(expected = "E609")]
    fn negative_count_is_fatal() {
        let mut n = StateCounts::new();
        n.leave(State::Immune);
    }
}
