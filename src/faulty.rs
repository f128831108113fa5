//! This module is for testing only

use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub type Journal = Rc<RefCell<Vec<Event>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Constructed(usize),
    Destroyed(usize),
}

/// The failure an injected fault raises: which call (1-based) tripped it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Injected {
    pub occurrence: usize,
}

const POISON: usize = usize::MAX;

/// Constructor and destructor callbacks over raw `usize` slots, either of which
/// can be told to fail on its n-th call.
///
/// A constructed slot holds its own index; a destroyed one holds `POISON`, so
/// destroying the same slot twice or a slot that was never built is caught.
pub struct Faults {
    pub journal: Journal,
    base: *mut u8,
    stride: usize,
    fail_construct_on: Option<usize>,
    fail_destroy_on: Option<usize>,
    construct_calls: Cell<usize>,
    destroy_calls: Cell<usize>,
    echo: bool,
}

impl Faults {
    pub fn new(base: *mut u8, stride: usize) -> Faults {
        Faults {
            journal: Journal::default(),
            base,
            stride,
            fail_construct_on: None,
            fail_destroy_on: None,
            construct_calls: Cell::new(0),
            destroy_calls: Cell::new(0),
            echo: false,
        }
    }

    pub fn fail_construct_on(mut self, occurrence: usize) -> Faults {
        self.fail_construct_on = Some(occurrence);
        self
    }

    pub fn fail_destroy_on(mut self, occurrence: usize) -> Faults {
        self.fail_destroy_on = Some(occurrence);
        self
    }

    /// Also write every event to stderr, for isolated child processes.
    pub fn echoing(mut self) -> Faults {
        self.echo = true;
        self
    }

    fn index_of(&self, slot: *mut u8) -> usize {
        (slot as usize - self.base as usize) / self.stride
    }

    fn record(&self, event: Event) {
        if self.echo {
            eprintln!("{:?}", event);
        }
        self.journal.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.journal.borrow().clone()
    }

    pub fn construct_one(&self) -> impl FnMut(*mut u8) -> Result<(), Injected> + '_ {
        move |slot| {
            let occurrence = self.construct_calls.get() + 1;
            self.construct_calls.set(occurrence);
            if self.fail_construct_on == Some(occurrence) {
                return Err(Injected { occurrence });
            }
            let index = self.index_of(slot);
            unsafe { (slot as *mut usize).write(index) };
            self.record(Event::Constructed(index));
            Ok(())
        }
    }

    pub fn destroy_one(&self) -> impl FnMut(*mut u8) -> Result<(), Injected> + '_ {
        move |slot| {
            let occurrence = self.destroy_calls.get() + 1;
            self.destroy_calls.set(occurrence);
            let index = self.index_of(slot);
            let stored = unsafe { (slot as *mut usize).replace(POISON) };
            assert_eq!(index, stored, "slot {} destroyed without being constructed", index);
            self.record(Event::Destroyed(index));
            if self.fail_destroy_on == Some(occurrence) {
                return Err(Injected { occurrence });
            }
            Ok(())
        }
    }
}

/// Instance bookkeeping shared by every `Tracked` element of one test.
pub struct Census {
    pub journal: Journal,
    live: Cell<usize>,
    created: Cell<usize>,
    fail_on: Option<usize>,
    panic_on_drop_of: Option<usize>,
}

impl Census {
    pub fn new() -> Rc<Census> {
        Census::with_faults(None, None)
    }

    /// `fail_on` is the 1-based creation that fails; `panic_on_drop_of` is
    /// the element index whose drop panics.
    pub fn with_faults(fail_on: Option<usize>, panic_on_drop_of: Option<usize>) -> Rc<Census> {
        Rc::new(Census {
            journal: Journal::default(),
            live: Cell::new(0),
            created: Cell::new(0),
            fail_on,
            panic_on_drop_of,
        })
    }

    /// Instances currently alive; anything left after teardown leaked.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    pub fn events(&self) -> Vec<Event> {
        self.journal.borrow().clone()
    }
}

/// An element type that counts its instances and can fail on a given creation.
#[derive(Debug)]
pub struct Tracked {
    pub index: usize,
    census: Rc<Census>,
}

impl Tracked {
    pub fn new(census: &Rc<Census>, index: usize) -> Result<Tracked, Injected> {
        let occurrence = census.created.get() + 1;
        census.created.set(occurrence);
        if census.fail_on == Some(occurrence) {
            return Err(Injected { occurrence });
        }
        census.live.set(census.live.get() + 1);
        census.journal.borrow_mut().push(Event::Constructed(index));
        eprintln!("{:?}", Event::Constructed(index));
        Ok(Tracked { index, census: census.clone() })
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.census.live.set(self.census.live.get() - 1);
        self.census.journal.borrow_mut().push(Event::Destroyed(self.index));
        eprintln!("{:?}", Event::Destroyed(self.index));
        if self.census.panic_on_drop_of == Some(self.index) {
            panic!("element {} refuses to be dropped", self.index);
        }
    }
}

impl std::fmt::Debug for Census {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Census").field("live", &self.live.get()).finish()
    }
}

/// Runs a single test of this binary in a child process, so that a test can
/// watch an abort from the outside.
pub mod isolated {
    use std::process::{Command, ExitStatus, Output};

    const CHILD_VAR: &str = "EHVEC_ISOLATED_CHILD";

    pub fn is_child() -> bool {
        std::env::var_os(CHILD_VAR).is_some()
    }

    pub fn run(test_name: &str) -> Output {
        let exe = std::env::current_exe().expect("test binary path");
        Command::new(exe)
            .args(&[test_name, "--exact", "--nocapture", "--test-threads=1"])
            .env(CHILD_VAR, "1")
            .output()
            .expect("spawn isolated test")
    }

    pub fn aborted(status: &ExitStatus) -> bool {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            status.signal() == Some(6)
        }
        #[cfg(not(unix))]
        {
            !status.success()
        }
    }

    pub fn stderr(output: &Output) -> String {
        String::from_utf8_lossy(&output.stderr).into_owned()
    }
}

#[test]
fn faults_catch_double_destroy() {
    let mut buffer = [0usize; 2];
    let base = buffer.as_mut_ptr() as *mut u8;
    let faults = Faults::new(base, std::mem::size_of::<usize>());
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut construct = faults.construct_one();
        let mut destroy = faults.destroy_one();
        construct(base).unwrap();
        destroy(base).unwrap();
        destroy(base).unwrap();
    }));
    assert!(result.is_err());
    assert_eq!(vec![Event::Constructed(0), Event::Destroyed(0)], faults.events());
}

#[test]
fn tracked_counts_instances() {
    let census = Census::with_faults(Some(2), None);
    let first = Tracked::new(&census, 0).unwrap();
    assert_eq!(1, census.live());
    assert_eq!(Err(Injected { occurrence: 2 }), Tracked::new(&census, 1).map(|t| t.index));
    assert_eq!(1, census.live());
    std::mem::drop(first);
    assert_eq!(0, census.live());
    assert_eq!(vec![Event::Constructed(0), Event::Destroyed(0)], census.events());
}
