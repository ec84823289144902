//! Host functions pre-registered in the global scope.
//!
//! | Name        | Arity | Effect                                              |
//! |-------------|------:|-----------------------------------------------------|
//! | `clock`     | 0     | seconds since the Unix epoch                        |
//! | `print`     | 1     | write the value, no newline                         |
//! | `printLine` | 1     | write the value and a newline                       |
//! | `readLine`  | 0     | next input line without its terminator, `nil` at EOF |

use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::callable::NativeFunction;
use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::value::Value;

pub const NATIVES: [NativeFunction; 4] = [
    NativeFunction {
        name: "clock",
        arity: 0,
        func: clock,
    },
    NativeFunction {
        name: "print",
        arity: 1,
        func: print,
    },
    NativeFunction {
        name: "printLine",
        arity: 1,
        func: print_line,
    },
    NativeFunction {
        name: "readLine",
        arity: 0,
        func: read_line,
    },
];

pub fn define_all(globals: &mut Environment) {
    for native in NATIVES {
        debug!("Defining native function '{}'", native.name);

        globals.define(native.name, Value::Native(Rc::new(native)));
    }
}

fn clock(_: &mut Interpreter, _: &[Value]) -> Result<Value, String> {
    let millis: i64 = Utc::now().timestamp_millis();

    Ok(Value::Number(millis as f64 / 1000.0))
}

fn print(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    interpreter.write_output(&args[0].to_string())?;

    Ok(Value::Nil)
}

fn print_line(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    interpreter.write_output(&format!("{}\n", args[0]))?;

    Ok(Value::Nil)
}

fn read_line(interpreter: &mut Interpreter, _: &[Value]) -> Result<Value, String> {
    let line: Option<String> = interpreter.read_input_line()?;

    info!("readLine got {:?}", line);

    Ok(line.map_or(Value::Nil, Value::String))
}
