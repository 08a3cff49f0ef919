// Name tokens understood by the name parser
//
// Where one token is a prefix of another, the longer one is replaced first.

pub const WINDOW_TITLE: &str = "%t";
pub const PROCESS_NAME: &str = "%pn";

pub const IMAGE_WIDTH: &str = "%width";
pub const IMAGE_HEIGHT: &str = "%height";

pub const YEAR: &str = "%y";
pub const YEAR_SHORT: &str = "%yy";
pub const MONTH: &str = "%mo";
pub const MONTH_NAME: &str = "%mon";
pub const MONTH_NAME_INVARIANT: &str = "%mon2";
pub const DAY: &str = "%d";
pub const HOUR: &str = "%h";
pub const MINUTE: &str = "%mi";
pub const SECOND: &str = "%s";
pub const MILLISECOND: &str = "%ms";
pub const WEEK_OF_YEAR: &str = "%wy";
pub const WEEKDAY_NAME: &str = "%w";
pub const WEEKDAY_NAME_INVARIANT: &str = "%w2";
pub const AM_PM: &str = "%pm";
pub const UNIX_TIMESTAMP: &str = "%unix";

pub const AUTO_INCREMENT: &str = "%i";
pub const AUTO_INCREMENT_HEX: &str = "%ix";
pub const AUTO_INCREMENT_HEX_UPPER: &str = "%iX";
pub const AUTO_INCREMENT_BASE36: &str = "%ia";
pub const AUTO_INCREMENT_BASE36_UPPER: &str = "%iA";
pub const AUTO_INCREMENT_BASE62: &str = "%iAa";
pub const AUTO_INCREMENT_BASE62_INVERSE: &str = "%iaA";
pub const AUTO_INCREMENT_BASE: &str = "%ib";
pub const AUTO_INCREMENT_BASE_UPPER: &str = "%iB";

pub const USER_NAME: &str = "%un";
pub const USER_LOGIN_NAME: &str = "%uln";
pub const MACHINE_NAME: &str = "%cn";

pub const NEW_LINE: &str = "%n";

pub const RANDOM_DIGIT: &str = "%rn";
pub const RANDOM_ALPHANUMERIC: &str = "%ra";
pub const RANDOM_NON_AMBIGUOUS: &str = "%rna";
pub const RANDOM_HEX: &str = "%rx";
pub const RANDOM_HEX_UPPER: &str = "%rX";
pub const RANDOM_LINE_FROM_FILE: &str = "%rf";

pub const GUID: &str = "%guid";
pub const GUID_UPPER: &str = "%GUID";

/// Every auto-increment variant; any of them triggers one counter increment
pub const AUTO_INCREMENT_TOKENS: [&str; 9] = [
    AUTO_INCREMENT,
    AUTO_INCREMENT_HEX,
    AUTO_INCREMENT_HEX_UPPER,
    AUTO_INCREMENT_BASE36,
    AUTO_INCREMENT_BASE36_UPPER,
    AUTO_INCREMENT_BASE62,
    AUTO_INCREMENT_BASE62_INVERSE,
    AUTO_INCREMENT_BASE,
    AUTO_INCREMENT_BASE_UPPER,
];

pub const NUMBERS: &str = "0123456789";
/// Upper-case letters sort before lower-case ones
pub const ALPHANUMERIC: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
/// Lower-case letters sort before upper-case ones
pub const ALPHANUMERIC_INVERSE: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// No 0/O, 1/l/I
pub const ALPHANUMERIC_NON_AMBIGUOUS: &str =
    "ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";
pub const HEXADECIMAL: &str = "0123456789abcdef";
