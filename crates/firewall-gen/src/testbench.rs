//! VHDL test-bench emission.
//!
//! The bench drives the AXI interface entity: a clock and a reset process, a
//! memory process that writes one rule per clock period, and a request
//! process that replays every request, checks the response port and logs
//! failures to `test_bench.log` in the format [`crate::report`] renders.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use firewall_core::{
    encode_unsigned, ConfigWrite, Dimensions, FirewallError, Operation, RequestVector, TestContext,
};

use crate::errors::GenError;
use crate::hdl::{interface_generics, interface_ports, GeneratedFile, INTERFACE_AXI};
use crate::report::{address_port, failure_context_lines, master_port};

/// File name of the emitted bench.
pub const TESTBENCH_FILE: &str = "Interface_AXI_tb.vhd";
/// Log file the bench writes failures to.
pub const TESTBENCH_LOG: &str = "test_bench.log";
/// Entity name of the emitted bench.
pub const TESTBENCH_ENTITY: &str = "generated_tb";

/// VHDL physical time unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    /// Femtoseconds.
    Fs,
    /// Picoseconds.
    Ps,
    /// Nanoseconds.
    Ns,
    /// Microseconds.
    #[default]
    Us,
    /// Milliseconds.
    Ms,
    /// Seconds.
    Sec,
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self {
            Self::Fs => "fs",
            Self::Ps => "ps",
            Self::Ns => "ns",
            Self::Us => "us",
            Self::Ms => "ms",
            Self::Sec => "sec",
        };
        f.write_str(unit)
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fs" => Ok(Self::Fs),
            "ps" => Ok(Self::Ps),
            "ns" => Ok(Self::Ns),
            "us" => Ok(Self::Us),
            "ms" => Ok(Self::Ms),
            "sec" | "s" => Ok(Self::Sec),
            other => Err(format!("unknown time unit: {other}")),
        }
    }
}

/// Clock timing of the emitted bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestbenchConfig {
    /// Clock period, in `unit`. Must be non-zero.
    pub period: u64,
    /// Time unit for every delay.
    pub unit: TimeUnit,
}

impl Default for TestbenchConfig {
    fn default() -> Self {
        Self {
            period: 10,
            unit: TimeUnit::Us,
        }
    }
}

impl TestbenchConfig {
    /// `half_periods` half clock periods as a VHDL time literal, e.g. `5 us` or `2.5 ns`.
    #[must_use]
    pub fn delay(&self, half_periods: u64) -> String {
        let total = half_periods.saturating_mul(self.period);
        if total % 2 == 0 {
            format!("{} {}", total / 2, self.unit)
        } else {
            format!("{}.5 {}", total / 2, self.unit)
        }
    }
}

/// Emits `Interface_AXI_tb.vhd` for the given rules and requests.
///
/// # Errors
///
/// Returns [`GenError::Firewall`] when a rule targets a slot outside the
/// table.
pub fn emit_testbench(
    dims: &Dimensions,
    config: &TestbenchConfig,
    rules: &[ConfigWrite],
    requests: &[RequestVector],
) -> Result<GeneratedFile, GenError> {
    let mut bench = header(dims, config);
    memory_process(&mut bench, dims, config, rules)?;
    request_process(&mut bench, dims, config, rules.len(), requests)?;
    Ok(GeneratedFile {
        name: TESTBENCH_FILE.to_string(),
        contents: bench,
    })
}

fn binary(value: u64, width: u32) -> Result<String, GenError> {
    if width == 0 {
        return Ok(String::new());
    }
    Ok(encode_unsigned(u128::from(value), width)?.to_string())
}

fn header(dims: &Dimensions, config: &TestbenchConfig) -> String {
    let constants: String = interface_generics(dims)
        .iter()
        .map(|(name, value)| format!("    constant {name:<22} : integer := {value};\n"))
        .collect();
    let ports = interface_ports(dims);
    let signals: String = ports
        .iter()
        .map(|port| format!("    signal {:<22} : {};\n", port.name, port.vhdl_type))
        .collect();
    let generic_map = interface_generics(dims)
        .iter()
        .map(|(name, _)| format!("        {name} => {name}"))
        .collect::<Vec<_>>()
        .join(",\n");
    let port_map = ports
        .iter()
        .map(|port| format!("        {0} => {0}", port.name))
        .collect::<Vec<_>>()
        .join(",\n");
    let half = config.delay(1);

    format!(
        r#"library ieee;
use ieee.std_logic_1164.all;
use ieee.numeric_std.all;
use std.textio.all;


entity {TESTBENCH_ENTITY} is
end {TESTBENCH_ENTITY};

architecture arch_interface of {TESTBENCH_ENTITY} is

{constants}
{signals}
    signal error_signal           : std_logic := '0';

    file log_file : text;

    -- compare a response port with the expected bit and log the failing test number
    impure function check_response(actual : std_logic; expected : std_logic; test_number : integer) return boolean is
        variable log_line : line;
    begin
        if actual = expected then
            report "Test PASSED" severity note;
            return true;
        else
            report "Test FAILED" severity error;
            write(log_line, string'("ERROR : test number "));
            write(log_line, integer'image(test_number));
            write(log_line, string'(" FAILED "));
            writeline(log_file, log_line);
            return false;
        end if;
    end function;

begin

    {INTERFACE_AXI}_inst: entity work.{INTERFACE_AXI}
    generic map(
{generic_map}
    )
    port map(
{port_map}
    );

    clock_process : process
    begin
        S_AXI_ACLK <= '0';
        wait for {half};
        S_AXI_ACLK <= '1';
        wait for {half};
    end process;

    reset_process : process
    begin
        S_AXI_ARESETN <= '1';
        wait for {half};
        S_AXI_ARESETN <= '0';
        wait;
    end process;

"#
    )
}

fn memory_process(
    bench: &mut String,
    dims: &Dimensions,
    config: &TestbenchConfig,
    rules: &[ConfigWrite],
) -> Result<(), GenError> {
    let half = config.delay(1);
    let period = config.delay(2);

    let _ = write!(
        bench,
        r"    -- rule memory configuration
    memory_process : process
    begin
        w_rule_enable <= '0';
        data_rule <= (others => '-');
        rule_number <= (others => '-');
        wait for {half};
"
    );

    for rule in rules {
        if rule.index >= dims.depth() {
            return Err(FirewallError::IndexOutOfRange {
                index: rule.index,
                depth: dims.depth(),
            }
            .into());
        }
        let index = binary(u64::try_from(rule.index).unwrap_or(u64::MAX), dims.id_width())?;
        let _ = write!(
            bench,
            r#"        rule_number <= "{index}";
        w_rule_enable <= '1';
        data_rule <= "{word}";
        wait for {period};
"#,
            word = rule.word
        );
    }

    bench.push_str(
        r"        w_rule_enable <= '0';
        data_rule <= (others => '-');
        rule_number <= (others => '-');
        wait;
    end process;

",
    );
    Ok(())
}

fn request_process(
    bench: &mut String,
    dims: &Dimensions,
    config: &TestbenchConfig,
    rule_count: usize,
    requests: &[RequestVector],
) -> Result<(), GenError> {
    // configuration finishes after half a period plus one period per rule; start one period later
    let rule_half_periods = u64::try_from(rule_count).unwrap_or(u64::MAX).saturating_mul(2);
    let start = config.delay(rule_half_periods.saturating_add(3));
    let period = config.delay(2);

    let _ = write!(
        bench,
        r#"    -- request replay
    request_process : process
        variable log_line : line;
        variable test_resp : boolean;
    begin
        file_open(log_file, "{TESTBENCH_LOG}", write_mode);
        wait for {start};
"#
    );

    for (position, vector) in requests.iter().enumerate() {
        let test_number = position + 1;
        let request = vector.request;
        let operation = request.operation();
        let response = match operation {
            Operation::Read => "wrapper_read_response",
            Operation::Write => "wrapper_write_response",
        };
        let (master, address) = (master_port(operation), address_port(operation));
        let master_bits = binary(request.master_id, dims.id_width())?;
        let address_bits = binary(request.address, dims.addr_width())?;
        let enable = u8::from(request.op_code.enable());
        let expected = u8::from(vector.expected);

        let context = TestContext {
            master_id: request.master_id,
            op_code: request.op_code,
            address: request.address,
            expected: vector.expected,
            actual: !vector.expected,
        };
        let log_writes: String = failure_context_lines(&context)
            .iter()
            .map(|line| {
                format!(
                    "            write(log_line, string'(\"{line}\"));\n            writeline(log_file, log_line);\n"
                )
            })
            .collect();

        let _ = write!(
            bench,
            r#"        ----------------------------------- TEST {test_number} -----------------------------------
        {master} <= "{master_bits}";
        x_enable <= '{enable}';
        {address} <= "{address_bits}";
        wait for {period};
        test_resp := check_response({response}, '{expected}', {test_number});
        if test_resp then
            error_signal <= '0';
        else
            error_signal <= '1';
{log_writes}        end if;
"#
        );
    }

    bench.push_str(
        r"        file_close(log_file);

        MID_W <= (others => '-');
        MID_R <= (others => '-');
        wait;
    end process;
end architecture;
",
    );
    Ok(())
}
