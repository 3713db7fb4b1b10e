use std::error;
use std::fmt;

use crate::alu::{self, AluOp};
use crate::isa::{Instruction, Nibble, Opcode, Operation};
use crate::memory::{AddressError, Byte, Memory};
use log::*;

/// Step limit used when none is given
pub const DEFAULT_MAX_STEPS: usize = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecError {
    /// An operand addressed memory which doesn't exist
    OutOfBounds { address: usize, size: usize },
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::OutOfBounds { address, size } => write!(
                f,
                "address `0x{:x}` is outside of {} bytes of memory",
                address, size
            ),
        }
    }
}

impl error::Error for ExecError {}

impl From<AddressError> for ExecError {
    fn from(err: AddressError) -> Self {
        ExecError::OutOfBounds {
            address: err.address,
            size: err.size,
        }
    }
}

pub type Result<T, E = ExecError> = std::result::Result<T, E>;

/// Observable effect of a single execution step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Executed,
    /// OUT wrote a value to the output stream
    Output(Byte),
    /// An unassigned opcode was fetched and skipped
    Invalid(Nibble),
    Halted,
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Halted,
    StepLimit,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Halted => f.write_str("halted"),
            Termination::StepLimit => f.write_str("step limit reached"),
        }
    }
}

/// Result of running a program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// Registers and flags after the last step
    pub processor: Processor,
    pub memory: Memory,
    /// Number of fetch-decode-execute cycles performed
    pub steps: usize,
    /// Every value written by OUT, in order
    pub output: Vec<Byte>,
    pub termination: Termination,
}

/// Emulates a CPU
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Processor {
    /// Program counter
    pub pc: Byte,
    /// Accumulator A
    pub a: Byte,
    /// Accumulator B, also receives ALU results
    pub b: Byte,
    /// Opcode of the last fetched instruction
    pub ir: Nibble,
    /// Operand of the last fetched instruction
    pub or: Nibble,
    pub zero: bool,
    pub carry: bool,
    /// Halt flag. Once set the processor doesn't change anymore.
    pub halted: bool,
}

impl Processor {
    /// Initializes a new CPU. Every register and flag is zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a single instruction. The program counter has already been
    /// advanced past it.
    pub fn execute_instruction(
        &mut self,
        instruction: Instruction,
        memory: &mut Memory,
    ) -> Result<Step> {
        let operand = usize::from(instruction.operand);

        let opcode = match instruction.operation {
            Operation::Known(opcode) => opcode,
            Operation::Unassigned(nibble) => {
                warn!(
                    "Invalid instruction 0x{:X} at {:02X}",
                    nibble,
                    self.instruction_address(memory)
                );
                return Ok(Step::Invalid(nibble));
            }
        };

        match opcode {
            Opcode::NOP => {
                debug!("PC: {:02X} NOP", self.instruction_address(memory));
            }
            Opcode::LDA => {
                self.a = memory.read_byte(operand)?;

                debug!("LDA {}: {}", operand, self.a);
            }
            Opcode::STA => {
                memory.write_byte(operand, self.a)?;

                debug!("STA {}: {}", operand, self.a);
            }
            Opcode::LDB => {
                self.b = memory.read_byte(operand)?;

                debug!("LDB {}: {}", operand, self.b);
            }
            Opcode::STB => {
                memory.write_byte(operand, self.b)?;

                debug!("STB {}: {}", operand, self.b);
            }
            Opcode::ADD => self.alu(AluOp::Add),
            Opcode::SUB => self.alu(AluOp::Sub),
            Opcode::JMP => {
                self.jump(operand, memory)?;

                debug!("JMP {}", operand);
            }
            Opcode::JNZ => {
                if !self.zero {
                    self.jump(operand, memory)?;
                }

                debug!("JNZ {}: taken = {}", operand, !self.zero);
            }
            Opcode::JNC => {
                if !self.carry {
                    self.jump(operand, memory)?;
                }

                debug!("JNC {}: taken = {}", operand, !self.carry);
            }
            Opcode::HLT => {
                self.halted = true; // set halt flag

                debug!("HLT");
                return Ok(Step::Halted);
            }
            Opcode::OUT => {
                info!("OUT: {}", self.a);
                return Ok(Step::Output(self.a));
            }
        }

        Ok(Step::Executed)
    }

    /// Runs one execution step: fetch, decode, advance the program counter
    /// and execute. Does nothing once the processor is halted.
    ///
    /// # Errors
    ///
    /// Fails if an operand addresses memory outside of `memory`.
    pub fn execute(&mut self, memory: &mut Memory) -> Result<Step> {
        if self.halted {
            return Ok(Step::Halted);
        }

        let pc = usize::from(self.pc);
        let byte = memory.read_byte(pc)?; // read instruction where PC is
        let instruction = Instruction::decode(byte);

        self.ir = instruction.operation.nibble();
        self.or = instruction.operand;
        // memory never exceeds 256 bytes, so the wrapped address fits a byte
        self.pc = ((pc + 1) % memory.len()) as Byte;

        self.execute_instruction(instruction, memory)
    }

    /// Runs the program in `memory` until it halts or `max_steps` steps have
    /// been executed, whichever comes first.
    pub fn run(mut self, mut memory: Memory, max_steps: usize) -> Result<Run> {
        let mut steps = 0;
        let mut output = Vec::new();

        while !self.halted && steps < max_steps {
            let step = self.execute(&mut memory)?;
            steps += 1;

            if let Step::Output(value) = step {
                output.push(value);
            }
        }

        let termination = if self.halted {
            Termination::Halted
        } else {
            Termination::StepLimit
        };
        info!("Simulation ended after {} steps ({})", steps, termination);

        Ok(Run {
            processor: self,
            memory,
            steps,
            output,
            termination,
        })
    }

    /// Renders registers in hexadecimal and flags as 0 or 1
    pub fn core_dump(&self) -> String {
        format!(
            "Core Dump:\n\
             \tPC: {:02X}\n\
             \tRA: {:02X}\n\
             \tRB: {:02X}\n\
             \tIR: {:02X}\n\
             \tOR: {:02X}\n\
             \tFlags:\n\
             \t\tZero: {}\n\
             \t\tCarry: {}\n\
             \t\tHalt: {}\n",
            self.pc,
            self.a,
            self.b,
            self.ir,
            self.or,
            u8::from(self.zero),
            u8::from(self.carry),
            u8::from(self.halted),
        )
    }

    /// B = A op B
    fn alu(&mut self, op: AluOp) {
        let result = alu::apply(op, self.a, self.b);
        debug!("{:?} {} {}: {}", op, self.a, self.b, result.value);

        self.b = result.value;
        self.zero = result.zero;
        self.carry = result.carry;
    }

    fn jump(&mut self, target: usize, memory: &Memory) -> Result<()> {
        if target >= memory.len() {
            return Err(ExecError::OutOfBounds {
                address: target,
                size: memory.len(),
            });
        }
        self.pc = target as Byte;

        Ok(())
    }

    /// Address the current instruction was fetched from
    fn instruction_address(&self, memory: &Memory) -> usize {
        (usize::from(self.pc) + memory.len() - 1) % memory.len()
    }
}

impl fmt::Display for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.core_dump())
    }
}

#[cfg(test)]
mod tests {
    use crate::memory::Memory;
    use crate::write_instructions;

    use super::*;
    use color_eyre::eyre::Result;

    /// Memory holding the program at address 0 and data at address 5 and 6
    fn scenario() -> Result<Memory> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => LDA 5, LDB 6, ADD, OUT, HLT)?;
        mem.write_byte(5, 10)?;
        mem.write_byte(6, 20)?;

        Ok(mem)
    }

    #[test]
    fn test_no_operation() -> Result<()> {
        let mut mem = Memory::default();
        let mut cpu = Processor::default();

        assert_eq!(cpu.execute(&mut mem)?, Step::Executed);

        assert_eq!(mem, Memory::default());
        let mut cpu2 = Processor::default();
        cpu2.pc += 1;
        assert_eq!(cpu, cpu2);

        Ok(())
    }

    #[test]
    fn test_halt() -> Result<()> {
        let mut mem = Memory::default();
        let mut cpu = Processor::default();

        write_instructions!(mem : 0 => HLT, LDA 1)?;
        assert_eq!(cpu.execute(&mut mem)?, Step::Halted);
        assert!(cpu.halted);
        assert_eq!(cpu.pc, 1);
        assert_eq!(cpu.ir, 0xE);

        // nothing changes after halting
        let halted = cpu;
        assert_eq!(cpu.execute(&mut mem)?, Step::Halted);
        assert_eq!(cpu, halted);

        Ok(())
    }

    #[test]
    fn test_load_and_store() -> Result<()> {
        let mut mem = Memory::default();
        let mut cpu = Processor::default();

        write_instructions!(mem : 0 => LDA 8, LDB 9, STA 10, STB 11)?;
        mem.write_byte(8, 42)?;
        mem.write_byte(9, 7)?;

        for _ in 0..4 {
            assert_eq!(cpu.execute(&mut mem)?, Step::Executed);
        }

        assert_eq!(cpu.a, 42);
        assert_eq!(cpu.b, 7);
        assert_eq!(mem.read_byte(10)?, 42);
        assert_eq!(mem.read_byte(11)?, 7);
        assert_eq!(cpu.pc, 4);

        Ok(())
    }

    #[test]
    fn test_add_writes_b_only() -> Result<()> {
        let mut mem = Memory::default();
        let mut cpu = Processor {
            a: 0xFF,
            b: 0x01,
            ..Processor::default()
        };

        write_instructions!(mem : 0 => ADD)?;
        cpu.execute(&mut mem)?;

        assert_eq!(cpu.a, 0xFF);
        assert_eq!(cpu.b, 0x00);
        assert!(cpu.zero);
        assert!(cpu.carry);

        Ok(())
    }

    #[test]
    fn test_sub() -> Result<()> {
        let mut mem = Memory::default();
        let mut cpu = Processor {
            a: 0x05,
            b: 0x0A,
            ..Processor::default()
        };

        write_instructions!(mem : 0 => SUB)?;
        cpu.execute(&mut mem)?;

        assert_eq!(cpu.a, 0x05);
        assert_eq!(cpu.b, 0xFB);
        assert!(!cpu.zero);
        assert!(cpu.carry);

        Ok(())
    }

    #[test]
    fn test_jump() -> Result<()> {
        let mut mem = Memory::default();
        let mut cpu = Processor::default();

        write_instructions!(mem : 0 => JMP 9)?;
        cpu.execute(&mut mem)?;

        assert_eq!(cpu.pc, 9);

        Ok(())
    }

    #[test]
    fn test_jump_if_not_zero() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => JNZ 9)?;

        let mut cpu = Processor::default();
        cpu.execute(&mut mem)?;
        assert_eq!(cpu.pc, 9); // taken

        let mut cpu = Processor {
            zero: true,
            ..Processor::default()
        };
        cpu.execute(&mut mem)?;
        assert_eq!(cpu.pc, 1); // not taken

        Ok(())
    }

    #[test]
    fn test_jump_if_not_carry() -> Result<()> {
        let mut mem = Memory::default();
        write_instructions!(mem : 0 => JNC 9)?;

        let mut cpu = Processor {
            zero: true,
            ..Processor::default()
        };
        cpu.execute(&mut mem)?;
        assert_eq!(cpu.pc, 9); // taken, zero flag is irrelevant

        let mut cpu = Processor {
            carry: true,
            ..Processor::default()
        };
        cpu.execute(&mut mem)?;
        assert_eq!(cpu.pc, 1); // not taken

        Ok(())
    }

    #[test]
    fn test_output() -> Result<()> {
        let mut mem = Memory::default();
        let mut cpu = Processor {
            a: 200,
            ..Processor::default()
        };

        write_instructions!(mem : 0 => OUT)?;
        assert_eq!(cpu.execute(&mut mem)?, Step::Output(200));
        assert_eq!(cpu.a, 200);

        Ok(())
    }

    #[test]
    fn test_invalid_instruction_continues() -> Result<()> {
        let mem = Memory::from_image(&[0xA3, 0xB0, 0xC0, 0xD0, 0xE0], 16)?;
        let mut cpu = Processor::default();
        let mut mem2 = mem.clone();

        assert_eq!(cpu.execute(&mut mem2)?, Step::Invalid(0xA));
        assert_eq!(cpu.pc, 1);
        assert_eq!(cpu.ir, 0xA);
        assert_eq!(cpu.or, 0x3);
        assert_eq!(mem2, mem);

        let run = Processor::new().run(mem, DEFAULT_MAX_STEPS)?;
        assert_eq!(run.termination, Termination::Halted);
        assert_eq!(run.steps, 5);

        Ok(())
    }

    #[test]
    fn test_address_out_of_bounds() -> Result<()> {
        let mut mem = Memory::new(8)?;
        let mut cpu = Processor::default();

        write_instructions!(mem : 0 => LDA 9)?;
        assert_eq!(
            cpu.execute(&mut mem),
            Err(ExecError::OutOfBounds {
                address: 9,
                size: 8
            })
        );

        let mut mem = Memory::new(8)?;
        write_instructions!(mem : 0 => STB 8)?;
        assert!(Processor::new().run(mem, DEFAULT_MAX_STEPS).is_err());

        Ok(())
    }

    #[test]
    fn test_load_b_and_store_a_out_of_bounds() -> Result<()> {
        let mut mem = Memory::new(8)?;
        write_instructions!(mem : 0 => LDB 15)?;
        assert_eq!(
            Processor::new().execute(&mut mem),
            Err(ExecError::OutOfBounds {
                address: 15,
                size: 8
            })
        );

        let mut mem = Memory::new(8)?;
        write_instructions!(mem : 0 => STA 8)?;
        let image = mem.clone();
        let mut cpu = Processor {
            a: 42,
            ..Processor::default()
        };
        assert_eq!(
            cpu.execute(&mut mem),
            Err(ExecError::OutOfBounds {
                address: 8,
                size: 8
            })
        );
        assert_eq!(mem, image);

        Ok(())
    }

    #[test]
    fn test_untaken_jump_ignores_target() -> Result<()> {
        let mut mem = Memory::new(8)?;
        write_instructions!(mem : 0 => JNZ 12, JNC 13)?;

        let mut cpu = Processor {
            zero: true,
            carry: true,
            ..Processor::default()
        };
        assert_eq!(cpu.execute(&mut mem)?, Step::Executed);
        assert_eq!(cpu.pc, 1);
        assert_eq!(cpu.execute(&mut mem)?, Step::Executed);
        assert_eq!(cpu.pc, 2);

        // the same jumps fail once they are taken
        let mut cpu = Processor::default();
        assert_eq!(
            cpu.execute(&mut mem),
            Err(ExecError::OutOfBounds {
                address: 12,
                size: 8
            })
        );
        let mut cpu = Processor {
            pc: 1,
            ..Processor::default()
        };
        assert_eq!(
            cpu.execute(&mut mem),
            Err(ExecError::OutOfBounds {
                address: 13,
                size: 8
            })
        );

        Ok(())
    }

    #[test]
    fn test_jump_target_out_of_bounds() -> Result<()> {
        let mut mem = Memory::new(8)?;
        write_instructions!(mem : 0 => JMP 12)?;

        assert_eq!(
            Processor::new().run(mem, DEFAULT_MAX_STEPS),
            Err(ExecError::OutOfBounds {
                address: 12,
                size: 8
            })
        );

        Ok(())
    }

    #[test]
    fn test_program_counter_wraps() -> Result<()> {
        let mut mem = Memory::new(4)?;
        let mut cpu = Processor {
            pc: 3,
            ..Processor::default()
        };

        cpu.execute(&mut mem)?;
        assert_eq!(cpu.pc, 0);

        Ok(())
    }

    #[test]
    fn test_scenario_trace() -> Result<()> {
        let mut mem = scenario()?;
        let mut cpu = Processor::default();

        assert_eq!(cpu.execute(&mut mem)?, Step::Executed);
        assert_eq!(cpu.a, 10);

        assert_eq!(cpu.execute(&mut mem)?, Step::Executed);
        assert_eq!(cpu.b, 20);

        assert_eq!(cpu.execute(&mut mem)?, Step::Executed);
        assert_eq!(cpu.b, 30);
        assert!(!cpu.zero);
        assert!(!cpu.carry);

        // OUT prints A, the sum only lives in B
        assert_eq!(cpu.execute(&mut mem)?, Step::Output(10));

        assert_eq!(cpu.execute(&mut mem)?, Step::Halted);
        assert!(cpu.halted);

        Ok(())
    }

    #[test]
    fn test_scenario_run() -> Result<()> {
        let run = Processor::new().run(scenario()?, DEFAULT_MAX_STEPS)?;

        assert_eq!(run.steps, 5);
        assert_eq!(run.output, vec![10]);
        assert_eq!(run.termination, Termination::Halted);
        assert_eq!(run.processor.a, 10);
        assert_eq!(run.processor.b, 30);
        assert_eq!(run.processor.pc, 5);
        assert_eq!(run.memory, scenario()?);

        // runs are deterministic
        assert_eq!(run, Processor::new().run(scenario()?, DEFAULT_MAX_STEPS)?);

        Ok(())
    }

    #[test]
    fn test_step_limit() -> Result<()> {
        // memory full of NOPs never halts
        let run = Processor::new().run(Memory::default(), 100)?;

        assert_eq!(run.steps, 100);
        assert_eq!(run.termination, Termination::StepLimit);
        assert!(!run.processor.halted);
        assert_eq!(run.processor.pc, (100 % 16) as Byte);

        let run = Processor::new().run(scenario()?, 3)?;
        assert_eq!(run.steps, 3);
        assert_eq!(run.termination, Termination::StepLimit);
        assert!(run.output.is_empty());

        let run = Processor::new().run(scenario()?, 0)?;
        assert_eq!(run.steps, 0);
        assert_eq!(run.processor, Processor::default());

        Ok(())
    }

    #[test]
    fn test_countdown_loop() -> Result<()> {
        // counts the byte at address 14 down to zero, printing each value
        let mut mem = Memory::default();
        write_instructions!(mem : 0 =>
            LDA 14, // A = counter
            LDB 15, // B = 1
            SUB,    // B = counter - 1
            STB 14, // counter = B
            LDA 14,
            OUT,
            JNZ 0,
            HLT
        )?;
        mem.write_byte(14, 3)?;
        mem.write_byte(15, 1)?;

        let run = Processor::new().run(mem, DEFAULT_MAX_STEPS)?;

        assert_eq!(run.output, vec![2, 1, 0]);
        assert_eq!(run.termination, Termination::Halted);
        assert_eq!(run.steps, 3 * 7 + 1);

        Ok(())
    }

    #[test]
    fn test_core_dump() -> Result<()> {
        let run = Processor::new().run(scenario()?, DEFAULT_MAX_STEPS)?;

        assert_eq!(
            run.processor.core_dump(),
            "Core Dump:\n\tPC: 05\n\tRA: 0A\n\tRB: 1E\n\tIR: 0E\n\tOR: 00\n\
             \tFlags:\n\t\tZero: 0\n\t\tCarry: 0\n\t\tHalt: 1\n"
        );

        Ok(())
    }
}
