use anyhow::Result;

/// Parses the `times` property of a tile feature, `[t1,t2,...]` in epoch seconds, and returns
/// each value relative to `epoch_origin`.
pub fn parse_relative(raw: &str, epoch_origin: i64) -> Result<Vec<i64>> {
    let raw = raw.trim();
    let inner = match raw
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        Some(x) => x.trim(),
        None => bail!("times {raw:?} isn't bracket-delimited"),
    };
    if inner.is_empty() {
        return Ok(Vec::new());
    }

    let mut result = Vec::new();
    for value in inner.split(',') {
        let value = value.trim();
        let t: i64 = value
            .parse()
            .map_err(|err| anyhow!("bad timestamp {value:?} in times: {err}"))?;
        let relative = t
            .checked_sub(epoch_origin)
            .ok_or_else(|| anyhow!("timestamp {t} out of range"))?;
        result.push(relative);
    }
    Ok(result)
}

/// Splits one flat timestamp list across consecutive lines, each line taking as many values as
/// it has vertices. The pieces concatenate back to `times`.
pub fn partition(times: &[i64], line_lengths: &[usize]) -> Result<Vec<Vec<i64>>> {
    let total: usize = line_lengths.iter().sum();
    if total != times.len() {
        bail!(
            "{} vertices across {} lines, but {} timestamps",
            total,
            line_lengths.len(),
            times.len()
        );
    }

    let mut result = Vec::new();
    let mut offset = 0;
    for len in line_lengths {
        result.push(times[offset..offset + len].to_vec());
        offset += len;
    }
    Ok(result)
}
