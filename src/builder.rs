//! Indentation-tracking emitter for block-structured Ruby.
//!
//! Handlers describe their output as a small [`Statement`] tree; the assembler
//! replays that tree into a [`CodeBuilder`], which owns indentation and checks
//! that every opened block is closed before the text is handed out.

use crate::error::StructureError;

const INDENT: &str = "  ";

/// Generated code, independent of indentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Line(String),
    /// A header line, an indented body, and a footer at the header's level
    Block {
        header: String,
        body: Vec<Statement>,
        footer: String,
    },
    /// `if` / `elsif` / `else` arms sharing one closing `end`
    Branches(Vec<Arm>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arm {
    pub header: String,
    pub body: Vec<Statement>,
}

impl Statement {
    pub fn line(text: impl Into<String>) -> Self {
        Self::Line(text.into())
    }

    pub fn blank() -> Self {
        Self::Line(String::new())
    }

    /// Block closed with Ruby's `end`
    pub fn block(header: impl Into<String>, body: Vec<Statement>) -> Self {
        Self::Block {
            header: header.into(),
            body,
            footer: "end".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CodeBuilder {
    lines: Vec<String>,
    indent: usize,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Append a line at the current indent. Empty lines carry no indentation.
    pub fn emit(&mut self, line: &str) {
        if line.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{}", INDENT.repeat(self.indent), line));
        }
    }

    pub fn open_block(&mut self, header: &str) {
        self.emit(header);
        self.indent += 1;
    }

    pub fn close_block(&mut self, footer: &str) -> Result<(), StructureError> {
        if self.indent == 0 {
            return Err(StructureError::CloseWithoutOpen {
                footer: footer.to_string(),
            });
        }
        self.indent -= 1;
        self.emit(footer);
        Ok(())
    }

    /// Emit `header` one level out and continue inside it (`elsif`, `else`).
    pub fn next_arm(&mut self, header: &str) -> Result<(), StructureError> {
        if self.indent == 0 {
            return Err(StructureError::ArmWithoutOpen {
                header: header.to_string(),
            });
        }
        self.indent -= 1;
        self.open_block(header);
        Ok(())
    }

    pub fn require(&mut self, module: &str) -> Result<(), StructureError> {
        if self.indent != 0 {
            return Err(StructureError::RequireInsideBlock {
                module: module.to_string(),
                indent: self.indent,
            });
        }
        self.emit(&format!("require '{}'", module));
        Ok(())
    }

    pub fn write(&mut self, statement: &Statement) -> Result<(), StructureError> {
        match statement {
            Statement::Line(line) => self.emit(line),
            Statement::Block {
                header,
                body,
                footer,
            } => {
                self.open_block(header);
                self.write_all(body)?;
                self.close_block(footer)?;
            }
            Statement::Branches(arms) => {
                for (i, arm) in arms.iter().enumerate() {
                    if i == 0 {
                        self.open_block(&arm.header);
                    } else {
                        self.next_arm(&arm.header)?;
                    }
                    self.write_all(&arm.body)?;
                }
                if !arms.is_empty() {
                    self.close_block("end")?;
                }
            }
        }
        Ok(())
    }

    pub fn write_all(&mut self, statements: &[Statement]) -> Result<(), StructureError> {
        for statement in statements {
            self.write(statement)?;
        }
        Ok(())
    }

    /// The emitted text, provided every block was closed.
    pub fn serialize(&self) -> Result<String, StructureError> {
        if self.indent != 0 {
            return Err(StructureError::UnbalancedBlocks { open: self.indent });
        }
        let mut text = self.lines.join("\n");
        text.push('\n');
        Ok(text)
    }
}
