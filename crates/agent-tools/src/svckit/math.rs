//! Math Tools
//!
//! Arithmetic, statistics and equation solving. Every tool takes numeric
//! arguments (numbers or numeric strings) and returns its result as text.

use async_trait::async_trait;
use num_bigint::BigUint;
use serde_json::{json, Value};

use agent_core::{
    tool::{ParameterSchema, RunContext},
    AgentError, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MathOp {
    Multiply,
    Add,
    Subtract,
    Divide,
    Power,
    SquareRoot,
    Mean,
    Median,
    StandardDeviation,
    Percentage,
    Round,
    Factorial,
    Logarithm,
    Quadratic,
}

impl MathOp {
    pub const ALL: [MathOp; 14] = [
        MathOp::Multiply,
        MathOp::Add,
        MathOp::Subtract,
        MathOp::Divide,
        MathOp::Power,
        MathOp::SquareRoot,
        MathOp::Mean,
        MathOp::Median,
        MathOp::StandardDeviation,
        MathOp::Percentage,
        MathOp::Round,
        MathOp::Factorial,
        MathOp::Logarithm,
        MathOp::Quadratic,
    ];

    fn name(self) -> &'static str {
        match self {
            MathOp::Multiply => "multiply",
            MathOp::Add => "add",
            MathOp::Subtract => "subtract",
            MathOp::Divide => "divide",
            MathOp::Power => "power",
            MathOp::SquareRoot => "square_root",
            MathOp::Mean => "calculate_mean",
            MathOp::Median => "calculate_median",
            MathOp::StandardDeviation => "calculate_standard_deviation",
            MathOp::Percentage => "calculate_percentage",
            MathOp::Round => "round_number",
            MathOp::Factorial => "calculate_factorial",
            MathOp::Logarithm => "calculate_logarithm",
            MathOp::Quadratic => "solve_quadratic_equation",
        }
    }

    fn description(self) -> &'static str {
        match self {
            MathOp::Multiply => "Multiply two numbers and return the result.",
            MathOp::Add => "Add two numbers and return the result.",
            MathOp::Subtract => "Subtract b from a and return the result.",
            MathOp::Divide => "Divide a by b and return the result. Fails if b is zero.",
            MathOp::Power => "Calculate base raised to the power of exponent.",
            MathOp::SquareRoot => "Calculate the square root of a number. Fails if the number is negative.",
            MathOp::Mean => "Calculate the arithmetic mean (average) of a list of numbers.",
            MathOp::Median => "Calculate the median (middle value) of a list of numbers.",
            MathOp::StandardDeviation => "Calculate the sample standard deviation of a list of numbers.",
            MathOp::Percentage => "Calculate what percentage value is of total.",
            MathOp::Round => "Round a number to the specified number of decimal places (default: nearest integer).",
            MathOp::Factorial => "Calculate the factorial of a non-negative integer n (n!).",
            MathOp::Logarithm => "Calculate the logarithm of a number with the specified base (default is base 10).",
            MathOp::Quadratic => {
                "Solve a quadratic equation of the form ax² + bx + c = 0. Returns a list of 0, 1 or 2 real solutions."
            }
        }
    }

    fn parameters(self) -> Vec<ParameterSchema> {
        let num = |name: &str, description: &str| ParameterSchema::required(name, "number", description);
        let list = || vec![ParameterSchema::required("numbers", "array", "List of numbers")];

        match self {
            MathOp::Multiply | MathOp::Add | MathOp::Subtract => {
                vec![num("a", "First number"), num("b", "Second number")]
            }
            MathOp::Divide => vec![num("a", "Dividend"), num("b", "Divisor")],
            MathOp::Power => vec![num("base", "Base"), num("exponent", "Exponent")],
            MathOp::SquareRoot => vec![num("number", "Non-negative number")],
            MathOp::Mean | MathOp::Median | MathOp::StandardDeviation => list(),
            MathOp::Percentage => vec![num("value", "Part value"), num("total", "Whole value")],
            MathOp::Round => vec![
                num("number", "Number to round"),
                ParameterSchema::optional("decimal_places", "integer", "Decimal places to keep", None),
            ],
            MathOp::Factorial => vec![ParameterSchema::required("n", "integer", "Non-negative integer")],
            MathOp::Logarithm => vec![
                num("number", "Positive number"),
                ParameterSchema::optional("base", "number", "Logarithm base", Some(json!(10))),
            ],
            MathOp::Quadratic => vec![
                num("a", "Coefficient of x²"),
                num("b", "Coefficient of x"),
                num("c", "Constant term"),
            ],
        }
    }

    /// Evaluate against a call's arguments
    pub fn evaluate(self, call: &ToolCall) -> CoreResult<Value> {
        let out = match self {
            MathOp::Multiply => call.number("a")? * call.number("b")?,
            MathOp::Add => call.number("a")? + call.number("b")?,
            MathOp::Subtract => call.number("a")? - call.number("b")?,
            MathOp::Divide => {
                let b = call.number("b")?;
                if b == 0.0 {
                    return Err(invalid("Cannot divide by zero"));
                }
                call.number("a")? / b
            }
            MathOp::Power => call.number("base")?.powf(call.number("exponent")?),
            MathOp::SquareRoot => {
                let n = call.number("number")?;
                if n < 0.0 {
                    return Err(invalid("Cannot calculate square root of a negative number"));
                }
                n.sqrt()
            }
            MathOp::Mean => mean(&numbers(call)?)?,
            MathOp::Median => median(numbers(call)?)?,
            MathOp::StandardDeviation => sample_stdev(&numbers(call)?)?,
            MathOp::Percentage => {
                let total = call.number("total")?;
                if total == 0.0 {
                    return Err(invalid("Total cannot be zero"));
                }
                call.number("value")? / total * 100.0
            }
            MathOp::Round => round(call.number("number")?, call.optional_number("decimal_places")?)?,
            MathOp::Factorial => {
                let n = factorial(call.number("n")?)?;
                return Ok(u64::try_from(&n).map_or_else(|_| Value::String(n.to_string()), |small| json!(small)));
            }
            MathOp::Logarithm => logarithm(call.number("number")?, call.optional_number("base")?.unwrap_or(10.0))?,
            MathOp::Quadratic => {
                return solve_quadratic(call.number("a")?, call.number("b")?, call.number("c")?).map(|roots| json!(roots));
            }
        };
        Ok(json!(out))
    }
}

fn invalid(msg: &str) -> AgentError {
    AgentError::ToolExecution(msg.into())
}

fn numbers(call: &ToolCall) -> CoreResult<Vec<f64>> {
    let not_numbers = || AgentError::ToolValidation("Parameter 'numbers' must be a list of numbers".into());
    let Some(Value::Array(values)) = call.arguments.get("numbers") else {
        return Err(not_numbers());
    };
    values
        .iter()
        .map(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(not_numbers)
}

fn mean(values: &[f64]) -> CoreResult<f64> {
    if values.is_empty() {
        return Err(invalid("Cannot calculate mean of an empty list"));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(mut values: Vec<f64>) -> CoreResult<f64> {
    if values.is_empty() {
        return Err(invalid("Cannot calculate median of an empty list"));
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Ok(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

fn sample_stdev(values: &[f64]) -> CoreResult<f64> {
    if values.len() < 2 {
        return Err(invalid("Need at least two values to calculate standard deviation"));
    }
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Ok(variance.sqrt())
}

/// Half-to-even rounding; `None` rounds to an integer
fn round(number: f64, places: Option<f64>) -> CoreResult<f64> {
    let Some(places) = places else {
        return Ok(number.round_ties_even());
    };
    if places.fract() != 0.0 {
        return Err(AgentError::ToolValidation("decimal_places must be an integer".into()));
    }
    let factor = 10f64.powi(places as i32);
    Ok((number * factor).round_ties_even() / factor)
}

/// Largest accepted input; 1000! already has 2568 digits
const MAX_FACTORIAL_INPUT: u32 = 1000;

/// Exact n!, returned as a digit string once it no longer fits a `u64`
fn factorial(n: f64) -> CoreResult<BigUint> {
    if n.fract() != 0.0 {
        return Err(AgentError::ToolValidation("n must be an integer".into()));
    }
    if n < 0.0 {
        return Err(invalid("Cannot calculate factorial of a negative number"));
    }
    if n > f64::from(MAX_FACTORIAL_INPUT) {
        return Err(AgentError::ToolExecution(format!(
            "Factorial input must not exceed {}",
            MAX_FACTORIAL_INPUT
        )));
    }
    Ok((1..=n as u32).map(BigUint::from).product())
}

fn logarithm(number: f64, base: f64) -> CoreResult<f64> {
    if number <= 0.0 {
        return Err(invalid("Number must be positive for logarithm calculation"));
    }
    if base <= 0.0 || base == 1.0 {
        return Err(invalid("Base must be positive and not equal to 1"));
    }
    Ok(if base == 10.0 {
        number.log10()
    } else if base == std::f64::consts::E {
        number.ln()
    } else {
        number.ln() / base.ln()
    })
}

fn solve_quadratic(a: f64, b: f64, c: f64) -> CoreResult<Vec<f64>> {
    if a == 0.0 {
        if b == 0.0 {
            return Err(invalid("Not a valid quadratic equation (a and b are both zero)"));
        }
        return Ok(vec![-c / b]);
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        Err(invalid("No real solutions (discriminant is negative)"))
    } else if discriminant == 0.0 {
        Ok(vec![-b / (2.0 * a)])
    } else {
        let root = discriminant.sqrt();
        Ok(vec![(-b + root) / (2.0 * a), (-b - root) / (2.0 * a)])
    }
}

/// One math operation exposed as a tool
pub struct MathTool {
    op: MathOp,
}

impl MathTool {
    pub fn new(op: MathOp) -> Self {
        Self { op }
    }

    /// Every math operation, in catalog order
    pub fn all() -> Vec<MathTool> {
        MathOp::ALL.into_iter().map(MathTool::new).collect()
    }
}

#[async_trait]
impl Tool for MathTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.op.name().into(),
            description: self.op.description().into(),
            parameters: self.op.parameters(),
        }
    }

    async fn execute(&self, call: &ToolCall, _ctx: &RunContext) -> CoreResult<ToolResult> {
        match self.op.evaluate(call)? {
            Value::String(digits) => Ok(ToolResult::success(self.op.name(), digits)),
            value => Ok(ToolResult::json(self.op.name(), &value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(op: MathOp, args: Value) -> CoreResult<Value> {
        op.evaluate(&ToolCall::new(op.name(), args))
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval(MathOp::Multiply, json!({"a": 7, "b": 5})).unwrap(), json!(35.0));
        assert_eq!(eval(MathOp::Add, json!({"a": "35", "b": 12})).unwrap(), json!(47.0));
        assert_eq!(eval(MathOp::Subtract, json!({"a": 1, "b": 3})).unwrap(), json!(-2.0));
        assert_eq!(eval(MathOp::Power, json!({"base": 2, "exponent": 10})).unwrap(), json!(1024.0));
        assert_eq!(eval(MathOp::Percentage, json!({"value": 25, "total": 200})).unwrap(), json!(12.5));
    }

    #[test]
    fn test_domain_errors() {
        assert!(eval(MathOp::Divide, json!({"a": 1, "b": 0})).is_err());
        assert!(eval(MathOp::SquareRoot, json!({"number": -4})).is_err());
        assert!(eval(MathOp::Percentage, json!({"value": 1, "total": 0})).is_err());
        assert!(eval(MathOp::Logarithm, json!({"number": 10, "base": 1})).is_err());
        assert!(eval(MathOp::Logarithm, json!({"number": 0})).is_err());
        assert!(eval(MathOp::Factorial, json!({"n": -1})).is_err());
        assert!(eval(MathOp::Factorial, json!({"n": 2.5})).is_err());
    }

    #[test]
    fn test_statistics() {
        assert_eq!(eval(MathOp::Mean, json!({"numbers": [1, 2, 3, 4]})).unwrap(), json!(2.5));
        assert_eq!(eval(MathOp::Median, json!({"numbers": [5, 1, 3]})).unwrap(), json!(3.0));
        assert_eq!(eval(MathOp::Median, json!({"numbers": [4, 1, 3, 2]})).unwrap(), json!(2.5));
        let sd = eval(MathOp::StandardDeviation, json!({"numbers": [2, 4, 4, 4, 5, 5, 7, 9]}))
            .unwrap()
            .as_f64()
            .unwrap();
        assert!((sd - 2.138_089_935).abs() < 1e-6);
        assert!(eval(MathOp::StandardDeviation, json!({"numbers": [1]})).is_err());
        assert!(eval(MathOp::Mean, json!({"numbers": []})).is_err());
        assert!(eval(MathOp::Mean, json!({"numbers": "1,2"})).is_err());
    }

    #[test]
    fn test_round_and_log() {
        assert_eq!(eval(MathOp::Round, json!({"number": 2.5})).unwrap(), json!(2.0));
        assert_eq!(eval(MathOp::Round, json!({"number": 3.14159, "decimal_places": 2})).unwrap(), json!(3.14));
        assert_eq!(eval(MathOp::Logarithm, json!({"number": 1000})).unwrap(), json!(3.0));
        assert_eq!(eval(MathOp::Logarithm, json!({"number": 8, "base": 2})).unwrap(), json!(3.0));
        assert_eq!(eval(MathOp::Factorial, json!({"n": 5})).unwrap(), json!(120));
        assert_eq!(
            eval(MathOp::Factorial, json!({"n": 25})).unwrap(),
            json!("15511210043330985984000000")
        );
        assert_eq!(
            eval(MathOp::Factorial, json!({"n": 40})).unwrap(),
            json!("815915283247897734345611269596115894272000000000")
        );
        assert_eq!(
            eval(MathOp::Factorial, json!({"n": 1000})).unwrap().as_str().map(str::len),
            Some(2568)
        );
        assert!(eval(MathOp::Factorial, json!({"n": 1001})).is_err());
    }

    #[test]
    fn test_quadratic() {
        assert_eq!(eval(MathOp::Quadratic, json!({"a": 1, "b": -3, "c": 2})).unwrap(), json!([2.0, 1.0]));
        assert_eq!(eval(MathOp::Quadratic, json!({"a": 1, "b": 2, "c": 1})).unwrap(), json!([-1.0]));
        assert_eq!(eval(MathOp::Quadratic, json!({"a": 0, "b": 2, "c": -4})).unwrap(), json!([2.0]));
        assert!(eval(MathOp::Quadratic, json!({"a": 1, "b": 0, "c": 1})).is_err());
        assert!(eval(MathOp::Quadratic, json!({"a": 0, "b": 0, "c": 1})).is_err());
    }

    #[tokio::test]
    async fn test_tool_output_is_text() {
        let tool = MathTool::new(MathOp::Multiply);
        let result = tool
            .execute(&ToolCall::new("multiply", json!({"a": 7, "b": 5})), &RunContext::default())
            .await
            .unwrap();
        assert_eq!(result.output, "35.0");
        assert_eq!(MathTool::all().len(), 14);
    }
}
