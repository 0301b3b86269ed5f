use std::{
    collections::BTreeMap,
    fmt,
    io::{BufRead, Write},
    rc::Rc,
};

use num_bigint::{BigInt, RandBigInt};
use num_traits::{ToPrimitive, Zero};
use rand::rngs::OsRng;

use crate::{
    error::{EngineError, RuntimeError},
    interpreter::value::Value,
};

/// The compiled body of a line: a closure over its bound statements.
pub type LineCode = dyn Fn(&mut dyn Runtime) -> Result<(), RuntimeError>;

/// One schedulable program line: its number, its current count and its
/// compiled body.
///
/// `Line` is an immutable value; the executor replaces a line in its
/// table rather than mutating it, so an in-flight pass always sees the
/// counts as they were when the pass began reading them.
#[derive(Clone)]
pub struct Line {
    number: BigInt,
    count:  BigInt,
    code:   Rc<LineCode>,
}

impl Line {
    /// Creates a line with the given number, initial count and body.
    #[must_use]
    pub fn new(number: BigInt, count: BigInt, code: Rc<LineCode>) -> Self {
        Self { number, count, code }
    }

    /// The line's identifier.
    #[must_use]
    pub const fn number(&self) -> &BigInt {
        &self.number
    }

    /// The line's current count, its scheduling weight.
    #[must_use]
    pub const fn count(&self) -> &BigInt {
        &self.count
    }

    /// Produces a copy of the line with its count moved by `delta`,
    /// clamped at zero. A line whose count reaches zero is never
    /// selected again until something raises it.
    #[must_use]
    pub fn update_count(&self, delta: &BigInt) -> Self {
        let mut count = &self.count + delta;
        if count < BigInt::zero() {
            count = BigInt::zero();
        }
        Self { number: self.number.clone(),
               count,
               code: Rc::clone(&self.code) }
    }

    /// Runs the line's body against a runtime.
    ///
    /// # Errors
    /// Whatever the body raises: a failed cast, division by zero, an
    /// invalid code point or bound, or an I/O failure.
    pub fn run(&self, runtime: &mut dyn Runtime) -> Result<(), RuntimeError> {
        (self.code)(runtime)
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Line")
         .field("number", &self.number)
         .field("count", &self.count)
         .finish_non_exhaustive()
    }
}

/// The services a running line can call on.
///
/// Each pass of the executor hands the selected line a fresh runtime, so
/// the `again`/`defer` flags a line raises never leak into the next pass.
pub trait Runtime {
    /// `again(keep)`: when `keep` is true, the running line keeps its
    /// count this pass instead of losing one.
    fn again(&mut self, keep: bool);

    /// `defer(defer)`: like [`Self::again`], and additionally stops the
    /// rest of the line's statements when `defer` is true.
    fn defer(&mut self, defer: bool);

    /// `E(line)`: whether the line exists with a count above zero.
    fn line_exists(&self, number: &BigInt) -> bool;

    /// `N(line)`: the line's current count, or zero for an unknown line.
    fn count(&self, number: &BigInt) -> BigInt;

    /// `line # delta`: moves a line's count, clamped at zero. Updates
    /// aimed at numbers no line carries are ignored.
    fn update_count(&mut self, number: &BigInt, delta: &BigInt);

    /// `random(max)`: a uniform value in `[0, max)`.
    ///
    /// # Errors
    /// `RuntimeError::InvalidRandomBound` when `max` is not positive.
    fn random(&mut self, max: &BigInt) -> Result<BigInt, RuntimeError>;

    /// `print(value)`: writes the value and a line break to the output.
    ///
    /// # Errors
    /// `RuntimeError::Io` when the output cannot be written.
    fn print(&mut self, value: &Value) -> Result<(), RuntimeError>;

    /// `read()`: reads one line of input, without its line break.
    ///
    /// # Errors
    /// `RuntimeError::Io` when the input cannot be read.
    fn read(&mut self) -> Result<String, RuntimeError>;

    /// `U(code)`: renders a Unicode scalar value as a string.
    ///
    /// # Errors
    /// `RuntimeError::InvalidCodePoint` when `code` is not a scalar
    /// value.
    fn unicode(&self, code: &BigInt) -> Result<String, RuntimeError>;

    /// Whether `defer(true)` has been called during this pass.
    fn deferred(&self) -> bool;

    /// Whether either flag asks the line to keep its count this pass.
    fn kept(&self) -> bool;
}

/// The stochastic scheduler.
///
/// Each step draws a line at random, weighted by the current counts,
/// runs it, and lowers its count by one unless the line asked to be kept.
/// Execution ends when every count has reached zero.
pub struct Executor {
    lines:  BTreeMap<BigInt, Line>,
    input:  Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The input and output streams are trait objects with no `Debug`.
        f.debug_struct("Executor")
            .field("lines", &self.lines.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Creates an executor over the process's standard input and output.
    ///
    /// # Errors
    /// [`EngineError::NoLines`] for an empty program and
    /// [`EngineError::DuplicateLine`] when two lines share a number.
    pub fn new(lines: Vec<Line>) -> Result<Self, EngineError> {
        Self::with_io(lines, std::io::BufReader::new(std::io::stdin()), std::io::stdout())
    }

    /// Creates an executor with explicit input and output streams.
    ///
    /// # Errors
    /// See [`Self::new`].
    pub fn with_io(lines: Vec<Line>,
                   input: impl BufRead + 'static,
                   output: impl Write + 'static)
                   -> Result<Self, EngineError> {
        if lines.is_empty() {
            return Err(EngineError::NoLines);
        }
        let mut table = BTreeMap::new();
        for line in lines {
            let number = line.number().clone();
            if table.insert(number.clone(), line).is_some() {
                return Err(EngineError::DuplicateLine { number });
            }
        }
        Ok(Self { lines:  table,
                  input:  Box::new(input),
                  output: Box::new(output), })
    }

    /// The current count of a line, or `None` for an unknown number.
    #[must_use]
    pub fn count(&self, number: &BigInt) -> Option<&BigInt> {
        self.lines.get(number).map(Line::count)
    }

    /// Runs the program to completion.
    ///
    /// # Errors
    /// The first runtime error any line raises; the program stops there.
    pub fn execute(&mut self) -> Result<(), RuntimeError> {
        while self.step()? {}
        Ok(())
    }

    /// Runs a single pass: selects one line by weighted draw, runs it,
    /// and settles its count. Returns `false` once every count is zero
    /// and the program has therefore finished.
    ///
    /// # Errors
    /// Whatever the selected line's body raises.
    pub fn step(&mut self) -> Result<bool, RuntimeError> {
        let total: BigInt = self.lines.values().map(Line::count).sum();
        if total.is_zero() {
            return Ok(false);
        }

        let draw = OsRng.gen_bigint_range(&BigInt::zero(), &total);
        let line = self.select(&draw);

        let mut pass = Pass { executor:     self,
                              should_defer: false,
                              should_keep:  false, };
        line.run(&mut pass)?;
        let keep = pass.should_keep || pass.should_defer;

        // The line may have updated its own count; settle against the
        // table's current entry, not the copy that ran.
        if !keep {
            if let Some(current) = self.lines.get(line.number()) {
                let settled = current.update_count(&BigInt::from(-1));
                self.lines.insert(line.number().clone(), settled);
            }
        }
        Ok(true)
    }

    /// Maps a draw in `[0, total)` onto a line by walking the counts in
    /// line-number order: each line with a positive count owns a
    /// half-open range of the draw space proportional to its count.
    fn select(&self, draw: &BigInt) -> Line {
        let mut cursor = BigInt::zero();
        for line in self.lines.values() {
            if line.count().is_zero() {
                continue;
            }
            cursor += line.count();
            if *draw < cursor {
                return line.clone();
            }
        }
        unreachable!("a draw below the total count always lands on a line")
    }
}

/// The per-pass runtime handed to a running line.
struct Pass<'a> {
    executor:     &'a mut Executor,
    should_defer: bool,
    should_keep:  bool,
}

impl Runtime for Pass<'_> {
    fn again(&mut self, keep: bool) {
        self.should_keep |= keep;
    }

    fn defer(&mut self, defer: bool) {
        self.should_defer |= defer;
    }

    fn line_exists(&self, number: &BigInt) -> bool {
        self.executor
            .lines
            .get(number)
            .is_some_and(|line| !line.count().is_zero())
    }

    fn count(&self, number: &BigInt) -> BigInt {
        self.executor
            .lines
            .get(number)
            .map_or_else(BigInt::zero, |line| line.count().clone())
    }

    fn update_count(&mut self, number: &BigInt, delta: &BigInt) {
        if let Some(line) = self.executor.lines.get(number) {
            let updated = line.update_count(delta);
            self.executor.lines.insert(number.clone(), updated);
        }
    }

    fn random(&mut self, max: &BigInt) -> Result<BigInt, RuntimeError> {
        if *max <= BigInt::zero() {
            return Err(RuntimeError::InvalidRandomBound { max: max.clone() });
        }
        Ok(OsRng.gen_bigint_range(&BigInt::zero(), max))
    }

    fn print(&mut self, value: &Value) -> Result<(), RuntimeError> {
        writeln!(self.executor.output, "{value}")?;
        Ok(())
    }

    fn read(&mut self) -> Result<String, RuntimeError> {
        let mut buffer = String::new();
        self.executor.input.read_line(&mut buffer)?;
        while buffer.ends_with('\n') || buffer.ends_with('\r') {
            buffer.pop();
        }
        Ok(buffer)
    }

    fn unicode(&self, code: &BigInt) -> Result<String, RuntimeError> {
        code.to_u32()
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| RuntimeError::InvalidCodePoint { value: code.clone() })
    }

    fn deferred(&self) -> bool {
        self.should_defer
    }

    fn kept(&self) -> bool {
        self.should_keep || self.should_defer
    }
}
