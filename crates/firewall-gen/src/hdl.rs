//! VHDL emission for the rule memory, the matcher and the AXI interface.
//!
//! Every width and field slice comes from [`Dimensions`] and its
//! [`FieldLayout`](firewall_core::FieldLayout); the emitted matcher checks
//! exactly the fields the native matcher checks.

use firewall_core::{BitRange, Dimensions};

/// File name stem of the rule memory entity.
pub const RULES_ARRAY: &str = "rules_array";
/// File name stem of the matcher entity.
pub const WRAPPER: &str = "wrapper";
/// File name stem of the AXI slave entity.
pub const INTERFACE_AXI: &str = "interface_AXI";
/// Width of the AXI transaction id generic; unrelated to the master id.
pub const AXI_TRANSACTION_ID_WIDTH: u32 = 3;

/// One emitted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File name, including extension.
    pub name: String,
    /// Full file contents.
    pub contents: String,
}

impl GeneratedFile {
    fn vhdl(stem: &str, contents: String) -> Self {
        Self {
            name: format!("{stem}.vhd"),
            contents,
        }
    }
}

/// Emits `rules_array.vhd`, `wrapper.vhd` and `interface_AXI.vhd`.
#[must_use]
pub fn emit_hdl(dims: &Dimensions) -> Vec<GeneratedFile> {
    vec![
        GeneratedFile::vhdl(RULES_ARRAY, rules_array_vhdl(dims)),
        GeneratedFile::vhdl(WRAPPER, wrapper_vhdl(dims)),
        GeneratedFile::vhdl(INTERFACE_AXI, interface_axi_vhdl(dims)),
    ]
}

/// `N-1 downto 0` for an `N`-bit vector; a null range when `N` is zero.
#[must_use]
pub fn downto(width: u32) -> String {
    format!("{} downto 0", i64::from(width) - 1)
}

/// `msb downto lsb` for one rule-word field; a null range for an empty field.
#[must_use]
pub fn field_slice(range: BitRange) -> String {
    let msb = i64::from(range.lsb) + i64::from(range.width) - 1;
    format!("{msb} downto {}", range.lsb)
}

/// Package with the memory array type and the rule memory entity.
#[must_use]
pub fn rules_array_vhdl(dims: &Dimensions) -> String {
    let last_slot = dims.depth() - 1;
    let word = downto(dims.word_width());
    let rule_number = downto(dims.id_width());

    format!(
        r"library ieee;
use ieee.std_logic_1164.all;

package Memory_type is
    type MemoryArrayType is array (0 to {last_slot}) of std_logic_vector({word});
end package Memory_type;

----------------------------------------------------------------------------------------------------

library ieee;
use ieee.std_logic_1164.all;
use ieee.numeric_std.all;
use work.Memory_type.all;

entity {RULES_ARRAY} is
    port(
        clk         : in std_logic;
        reset       : in std_logic;
        rule_number : in std_logic_vector({rule_number});
        w_enable    : in std_logic;
        data_in     : in std_logic_vector({word});

        data_out    : out MemoryArrayType
    );
end {RULES_ARRAY};

architecture {RULES_ARRAY}_rtl of {RULES_ARRAY} is
    signal memory_array : MemoryArrayType := (others => (others => '0'));
begin

    process(clk)
    begin
        if rising_edge(clk) then
            if reset = '1' then
                memory_array <= (others => (others => '0'));
            elsif w_enable = '1' then
                memory_array(to_integer(unsigned(rule_number))) <= data_in;
            end if;
        end if;
    end process;

    data_out <= memory_array;

end architecture;
"
    )
}

/// Matcher entity: OR-accumulates grants over every slot, silent while rules are written.
#[must_use]
pub fn wrapper_vhdl(dims: &Dimensions) -> String {
    let last_slot = dims.depth() - 1;
    let word = downto(dims.word_width());
    let id = downto(dims.id_width());
    let rwx = downto(dims.rwx_width());
    let addr = downto(dims.addr_width());
    let layout = dims.layout();
    let id_slice = field_slice(layout.id);
    let rwx_slice = field_slice(layout.rwx);
    let min_slice = field_slice(layout.addr_min);
    let max_slice = field_slice(layout.addr_max);

    format!(
        r#"library ieee;
use ieee.std_logic_1164.all;
use ieee.numeric_std.all;
use work.Memory_type.all;

entity {WRAPPER} is
    port (
        clk     : in std_logic;
        reset   : in std_logic;
        -- rule memory configuration
        w_rule_enable   : in std_logic;
        data_rule       : in std_logic_vector({word});
        rule_number     : in std_logic_vector({id});
        -- requests
        MID_W   : in std_logic_vector({id});
        MID_R   : in std_logic_vector({id});
        x_enable : in std_logic;
        addr_w  : in std_logic_vector({addr});
        addr_r  : in std_logic_vector({addr});
        -- decisions
        wrapper_write_response  : out std_logic := '0';
        wrapper_read_response   : out std_logic := '0'
    );
end {WRAPPER};

architecture {WRAPPER}_rtl of {WRAPPER} is
    signal rules_array : MemoryArrayType;
begin

    {RULES_ARRAY}_inst: entity work.{RULES_ARRAY}
     port map(
        clk => clk,
        reset => reset,
        rule_number => rule_number,
        w_enable => w_rule_enable,
        data_in => data_rule,
        data_out => rules_array
    );

    -- grant a port when any rule matches its master id, operation and address range
    process (clk)
        variable res_w : std_logic := '0';
        variable res_r : std_logic := '0';

        variable field_id : std_logic_vector({id});
        variable field_rwx : std_logic_vector({rwx});
        variable field_addr_min : std_logic_vector({addr});
        variable field_addr_max : std_logic_vector({addr});

    begin
        if rising_edge(clk) then
            if w_rule_enable /= '1' then
                res_w := '0';
                res_r := '0';
                rule_loop: for i in 0 to {last_slot} loop
                    field_id := rules_array(i)({id_slice});
                    field_rwx := rules_array(i)({rwx_slice});
                    field_addr_min := rules_array(i)({min_slice});
                    field_addr_max := rules_array(i)({max_slice});
                    if field_id = MID_W and field_rwx = ("01" & x_enable) and unsigned(addr_w) >= unsigned(field_addr_min) and unsigned(addr_w) < unsigned(field_addr_max) then
                        res_w := '1';
                    end if;
                    if field_id = MID_R and field_rwx = ("10" & x_enable) and unsigned(addr_r) >= unsigned(field_addr_min) and unsigned(addr_r) < unsigned(field_addr_max) then
                        res_r := '1';
                    end if;
                end loop;
                wrapper_write_response <= res_w;
                wrapper_read_response <= res_r;
            else
                wrapper_write_response <= '0';
                wrapper_read_response <= '0';
            end if;
        end if;
    end process;

end architecture;
"#
    )
}

/// Direction of an interface port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    /// Driven by the master or the test bench.
    In,
    /// Driven by the firewall.
    Out,
}

impl PortDirection {
    const fn keyword(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// One port of the AXI interface entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfacePort {
    /// Port name.
    pub name: &'static str,
    /// Port direction.
    pub direction: PortDirection,
    /// VHDL subtype.
    pub vhdl_type: String,
}

const AXI_SLAVE_PORTS: &[(&str, PortDirection, &str)] = &[
    ("S_AXI_ACLK", PortDirection::In, "std_logic"),
    ("S_AXI_ARESETN", PortDirection::In, "std_logic"),
    ("S_AXI_AWID", PortDirection::In, "std_logic_vector(C_S_AXI_ID_WIDTH-1 downto 0)"),
    ("S_AXI_AWADDR", PortDirection::In, "std_logic_vector(C_S_AXI_ADDR_WIDTH-1 downto 0)"),
    ("S_AXI_AWLEN", PortDirection::In, "std_logic_vector(7 downto 0)"),
    ("S_AXI_AWSIZE", PortDirection::In, "std_logic_vector(2 downto 0)"),
    ("S_AXI_AWBURST", PortDirection::In, "std_logic_vector(1 downto 0)"),
    ("S_AXI_AWLOCK", PortDirection::In, "std_logic"),
    ("S_AXI_AWCACHE", PortDirection::In, "std_logic_vector(3 downto 0)"),
    ("S_AXI_AWPROT", PortDirection::In, "std_logic_vector(2 downto 0)"),
    ("S_AXI_AWQOS", PortDirection::In, "std_logic_vector(3 downto 0)"),
    ("S_AXI_AWREGION", PortDirection::In, "std_logic_vector(3 downto 0)"),
    ("S_AXI_AWUSER", PortDirection::In, "std_logic_vector(C_S_AXI_AWUSER_WIDTH-1 downto 0)"),
    ("S_AXI_AWVALID", PortDirection::In, "std_logic"),
    ("S_AXI_WDATA", PortDirection::In, "std_logic_vector(C_S_AXI_DATA_WIDTH-1 downto 0)"),
    ("S_AXI_WSTRB", PortDirection::In, "std_logic_vector((C_S_AXI_DATA_WIDTH/8)-1 downto 0)"),
    ("S_AXI_WLAST", PortDirection::In, "std_logic"),
    ("S_AXI_WUSER", PortDirection::In, "std_logic_vector(C_S_AXI_WUSER_WIDTH-1 downto 0)"),
    ("S_AXI_WVALID", PortDirection::In, "std_logic"),
    ("S_AXI_BREADY", PortDirection::In, "std_logic"),
    ("S_AXI_ARID", PortDirection::In, "std_logic_vector(C_S_AXI_ID_WIDTH-1 downto 0)"),
    ("S_AXI_ARADDR", PortDirection::In, "std_logic_vector(C_S_AXI_ADDR_WIDTH-1 downto 0)"),
    ("S_AXI_ARLEN", PortDirection::In, "std_logic_vector(7 downto 0)"),
    ("S_AXI_ARSIZE", PortDirection::In, "std_logic_vector(2 downto 0)"),
    ("S_AXI_ARBURST", PortDirection::In, "std_logic_vector(1 downto 0)"),
    ("S_AXI_ARLOCK", PortDirection::In, "std_logic"),
    ("S_AXI_ARCACHE", PortDirection::In, "std_logic_vector(3 downto 0)"),
    ("S_AXI_ARPROT", PortDirection::In, "std_logic_vector(2 downto 0)"),
    ("S_AXI_ARQOS", PortDirection::In, "std_logic_vector(3 downto 0)"),
    ("S_AXI_ARREGION", PortDirection::In, "std_logic_vector(3 downto 0)"),
    ("S_AXI_ARUSER", PortDirection::In, "std_logic_vector(C_S_AXI_ARUSER_WIDTH-1 downto 0)"),
    ("S_AXI_ARVALID", PortDirection::In, "std_logic"),
    ("S_AXI_RREADY", PortDirection::In, "std_logic"),
    ("S_AXI_AWREADY", PortDirection::Out, "std_logic"),
    ("S_AXI_WREADY", PortDirection::Out, "std_logic"),
    ("S_AXI_BID", PortDirection::Out, "std_logic_vector(C_S_AXI_ID_WIDTH-1 downto 0)"),
    ("S_AXI_BRESP", PortDirection::Out, "std_logic_vector(1 downto 0)"),
    ("S_AXI_BUSER", PortDirection::Out, "std_logic_vector(C_S_AXI_BUSER_WIDTH-1 downto 0)"),
    ("S_AXI_BVALID", PortDirection::Out, "std_logic"),
    ("S_AXI_ARREADY", PortDirection::Out, "std_logic"),
    ("S_AXI_RID", PortDirection::Out, "std_logic_vector(C_S_AXI_ID_WIDTH-1 downto 0)"),
    ("S_AXI_RDATA", PortDirection::Out, "std_logic_vector(C_S_AXI_DATA_WIDTH-1 downto 0)"),
    ("S_AXI_RRESP", PortDirection::Out, "std_logic_vector(1 downto 0)"),
    ("S_AXI_RLAST", PortDirection::Out, "std_logic"),
    ("S_AXI_RUSER", PortDirection::Out, "std_logic_vector(C_S_AXI_RUSER_WIDTH-1 downto 0)"),
    ("S_AXI_RVALID", PortDirection::Out, "std_logic"),
];

/// Generics of the AXI interface entity with their default values.
#[must_use]
pub fn interface_generics(dims: &Dimensions) -> Vec<(&'static str, u32)> {
    vec![
        ("C_S_AXI_ID_WIDTH", AXI_TRANSACTION_ID_WIDTH),
        ("C_S_AXI_DATA_WIDTH", dims.word_width()),
        ("C_S_AXI_ADDR_WIDTH", dims.addr_width()),
        ("C_S_AXI_AWUSER_WIDTH", 0),
        ("C_S_AXI_ARUSER_WIDTH", 0),
        ("C_S_AXI_WUSER_WIDTH", 0),
        ("C_S_AXI_RUSER_WIDTH", 0),
        ("C_S_AXI_BUSER_WIDTH", 0),
        ("C_MASTER_ID_WIDTH", dims.id_width()),
    ]
}

/// Ports of the AXI interface entity: firewall control ports first, then the AXI slave ports.
#[must_use]
pub fn interface_ports(dims: &Dimensions) -> Vec<InterfacePort> {
    let vector = |range: String| format!("std_logic_vector({range})");
    let firewall_ports = [
        ("rule_number", PortDirection::In, vector(downto(dims.id_width()))),
        ("data_rule", PortDirection::In, vector(downto(dims.word_width()))),
        ("w_rule_enable", PortDirection::In, "std_logic".to_string()),
        ("MID_R", PortDirection::In, vector("C_MASTER_ID_WIDTH-1 downto 0".to_string())),
        ("MID_W", PortDirection::In, vector("C_MASTER_ID_WIDTH-1 downto 0".to_string())),
        ("x_enable", PortDirection::In, "std_logic".to_string()),
        ("wrapper_write_response", PortDirection::Out, "std_logic".to_string()),
        ("wrapper_read_response", PortDirection::Out, "std_logic".to_string()),
    ];

    firewall_ports
        .into_iter()
        .chain(
            AXI_SLAVE_PORTS
                .iter()
                .map(|&(name, direction, ty)| (name, direction, ty.to_string())),
        )
        .map(|(name, direction, vhdl_type)| InterfacePort {
            name,
            direction,
            vhdl_type,
        })
        .collect()
}

/// AXI slave entity exposing the firewall ports and instantiating the matcher.
#[must_use]
pub fn interface_axi_vhdl(dims: &Dimensions) -> String {
    let generics = interface_generics(dims)
        .iter()
        .map(|(name, value)| format!("        {name:<22} : integer := {value}"))
        .collect::<Vec<_>>()
        .join(";\n");
    let ports = interface_ports(dims)
        .iter()
        .map(|port| {
            format!(
                "        {:<22} : {} {}",
                port.name,
                port.direction.keyword(),
                port.vhdl_type
            )
        })
        .collect::<Vec<_>>()
        .join(";\n");

    format!(
        r"library ieee;
use ieee.std_logic_1164.all;
use ieee.numeric_std.all;
use work.Memory_type.all;

entity {INTERFACE_AXI} is
    generic(
{generics}
    );
    port(
{ports}
    );
end {INTERFACE_AXI};

architecture {INTERFACE_AXI}_arch of {INTERFACE_AXI} is

begin

    {WRAPPER}_inst: entity work.{WRAPPER}
     port map(
        clk => S_AXI_ACLK,
        reset => S_AXI_ARESETN,
        w_rule_enable => w_rule_enable,
        data_rule => data_rule,
        rule_number => rule_number,
        MID_W => MID_W,
        MID_R => MID_R,
        x_enable => x_enable,
        addr_w => S_AXI_AWADDR,
        addr_r => S_AXI_ARADDR,
        wrapper_write_response => wrapper_write_response,
        wrapper_read_response => wrapper_read_response
    );

end architecture;
"
    )
}
