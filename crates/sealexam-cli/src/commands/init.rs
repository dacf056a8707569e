//! The `sealexam init` command.

use std::path::Path;

use anyhow::{Context, Result};

use sealexam_sources::config::CONFIG_FILE;

pub fn execute() -> Result<()> {
    std::fs::create_dir_all("data").context("failed to create data directory")?;

    let files = [
        (CONFIG_FILE, SAMPLE_CONFIG),
        ("data/questions-core.json", SAMPLE_CORE_BANK),
        ("data/questions-dwv.json", SAMPLE_DWV_BANK),
        ("data/blueprint-sample.json", SAMPLE_BLUEPRINT),
    ];

    for (path, content) in files {
        if Path::new(path).exists() {
            println!("{path} already exists, skipping.");
        } else {
            std::fs::write(path, content).with_context(|| format!("failed to write {path}"))?;
            println!("Created {path}");
        }
    }

    println!("\nNext steps:");
    println!("  1. Add your own banks under data/ and list them in {CONFIG_FILE}");
    println!("  2. Run: sealexam validate");
    println!("  3. Run: sealexam run --length 10");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# sealexam configuration

# Bank and blueprint locations are relative to this directory.
data_dir = "data"
blueprint = "blueprint-sample.json"
default_length = 10
mode = "exam"
use_blueprint = true

[[banks]]
name = "core"
location = "questions-core.json"

[[banks]]
name = "dwv"
location = "questions-dwv.json"

# Remote banks work too:
# [[banks]]
# name = "hydronic"
# location = "https://example.com/questions-hydronic.json"
"#;

const SAMPLE_BLUEPRINT: &str = r#"{
  "name": "Sample Plumber Blueprint",
  "totalQuestions": 125,
  "tasks": [
    { "taskId": "A-1", "title": "Performs safety-related functions", "count125": 25 },
    { "taskId": "A-2", "title": "Uses tools and equipment", "count125": 20 },
    { "taskId": "B-1", "title": "Installs drainage, waste and vent systems", "count125": 50 },
    { "taskId": "C-1", "title": "Installs water supply systems", "count125": 30 }
  ]
}
"#;

const SAMPLE_CORE_BANK: &str = r#"[
  {
    "id": "core-001",
    "bank": "core",
    "taskId": "A-1",
    "stem": "Before entering a confined space, what must be tested first?",
    "choices": ["Lighting levels", "Atmosphere", "Noise levels", "Temperature"],
    "answerIndex": 1,
    "explanation": "Oxygen content, flammable gases and toxic gases are tested before entry.",
    "references": [
      { "code": "OHS", "location": "Confined spaces", "confidence": "needs_verify" }
    ]
  },
  {
    "id": "core-002",
    "bank": "core",
    "taskId": "A-1",
    "stem": "Which document describes the hazards of a chemical product?",
    "choices": ["Safety data sheet", "Bill of lading", "Work order", "Permit"],
    "answerIndex": 0,
    "explanation": "The SDS lists hazards, handling and first aid for a product."
  },
  {
    "id": "core-003",
    "bank": "core",
    "taskId": "A-1",
    "stem": "What is the first step of a lockout procedure?",
    "choices": ["Apply the lock", "Notify affected workers", "Test the equipment", "Remove the guard"],
    "answerIndex": 1
  },
  {
    "id": "core-004",
    "bank": "core",
    "taskId": "A-2",
    "stem": "Which tool is used to remove burrs from the inside of cut copper tube?",
    "choices": ["Flaring tool", "Reamer", "Swaging tool", "Tube bender"],
    "answerIndex": 1,
    "explanation": "Reaming restores the full bore and reduces turbulence."
  },
  {
    "id": "core-005",
    "bank": "core",
    "taskId": "A-2",
    "stem": "A pipe wrench should be sized according to:",
    "choices": ["The pipe material", "The pipe diameter", "The wall thickness", "The fitting type"],
    "answerIndex": 1
  },
  {
    "id": "core-006",
    "bank": "core",
    "taskId": "A-2",
    "stem": "Which level is best suited to setting grade on a long drain run?",
    "choices": ["Torpedo level", "Line level", "Laser level", "Post level"],
    "answerIndex": 2
  }
]
"#;

const SAMPLE_DWV_BANK: &str = r#"[
  {
    "id": "dwv-001",
    "bank": "dwv",
    "taskId": "B-1",
    "stem": "What is the purpose of a trap in a drainage system?",
    "choices": ["Increase flow", "Prevent sewer gas entry", "Reduce noise", "Support the pipe"],
    "answerIndex": 1,
    "explanation": "The water seal in a trap blocks sewer gas from entering the building.",
    "references": [
      { "code": "NPC", "location": "Part 2 - Traps", "note": "Check the edition adopted locally.", "confidence": "needs_verify" }
    ]
  },
  {
    "id": "dwv-002",
    "bank": "dwv",
    "taskId": "B-1",
    "stem": "A vent pipe primarily protects which part of the drainage system?",
    "choices": ["The building sewer", "The trap seal", "The cleanout", "The fixture outlet"],
    "answerIndex": 1
  },
  {
    "id": "dwv-003",
    "bank": "dwv",
    "taskId": "B-1",
    "stem": "Cleanouts are required at which location?",
    "choices": ["The base of each soil or waste stack", "Every fixture", "Every vent", "Each trap arm"],
    "answerIndex": 0
  },
  {
    "id": "dwv-004",
    "bank": "dwv",
    "taskId": "B-1",
    "stem": "What does a backwater valve prevent?",
    "choices": ["Siphonage", "Sewage backflow into the building", "Water hammer", "Freezing"],
    "answerIndex": 1
  },
  {
    "id": "dwv-005",
    "bank": "dwv",
    "taskId": "C-1",
    "stem": "Which device protects a potable supply from back-siphonage at a hose bibb?",
    "choices": ["Check valve", "Vacuum breaker", "Pressure relief valve", "Strainer"],
    "answerIndex": 1
  },
  {
    "id": "dwv-006",
    "bank": "dwv",
    "taskId": "C-1",
    "stem": "Water hammer is best controlled with:",
    "choices": ["A larger meter", "An arrestor", "A smaller trap", "A vent"],
    "answerIndex": 1
  }
]
"#;
