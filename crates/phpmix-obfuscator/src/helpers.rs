//! The two helper preludes injected into obfuscated output. Signatures and warning
//! wording are part of the public contract: downstream code may call these
//! functions directly.

pub const XOR_DECODE_HELPER: &str = r#"if (!function_exists('_obfuscated_xor_decode')) {
    function _obfuscated_xor_decode($data_b64, $key_b64) {
        $data = base64_decode($data_b64);
        $key = base64_decode($key_b64);
        $out = '';
        $key_len = strlen($key);
        for ($i = 0, $n = strlen($data); $i < $n; $i++) {
            $out .= $data[$i] ^ $key[$i % $key_len];
        }
        return $out;
    }
}
"#;

pub const ARRAY_GET_HELPER: &str = r#"if (!function_exists('_phpmix_array_get')) {
    function _phpmix_array_get($arr, $key, $default = null) {
        if (is_array($arr)) {
            if (array_key_exists($key, $arr)) {
                return $arr[$key];
            }
            trigger_error('Undefined array key ' . var_export($key, true), E_USER_WARNING);
            return $default;
        }
        if ($arr instanceof ArrayAccess) {
            if ($arr->offsetExists($key)) {
                return $arr->offsetGet($key);
            }
            return $default;
        }
        trigger_error('Trying to access array offset on value of type ' . gettype($arr), E_USER_WARNING);
        return $default;
    }
}
"#;
